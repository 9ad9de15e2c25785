pub mod cpf;
pub mod db_utils;
pub mod lenient;
pub mod pagination;
