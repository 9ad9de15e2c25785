pub mod attendance;
pub mod bonus;
pub mod catalog;
pub mod client;
pub mod employee;
pub mod financial;
pub mod job_title;
pub mod report;
pub mod wash;

use actix_web::{HttpResponse, http::header};
use chrono::NaiveDate;

/// Server-local calendar date used as the default reference date.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// CSV body served as a download.
pub(crate) fn csv_response(filename: &str, body: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(body)
}
