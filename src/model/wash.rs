use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::service::window::DateRange;
use crate::utils::lenient;

/// Tag on every wash entry: dirty boxes or washed per load.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, EnumString,
    AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum WashKind {
    #[default]
    #[strum(serialize = "sujo")]
    Dirty,
    #[strum(serialize = "carga")]
    PerLoad,
}

impl TryFrom<String> for WashKind {
    type Error = strum::ParseError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        code.parse()
    }
}

/// Trailer wash priced per box.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CarretaWash {
    pub id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    /// Trailer or driver identification.
    pub trailer_ident: String,
    pub client_id: Option<u64>,
    #[sqlx(try_from = "String")]
    pub wash_kind: WashKind,
    pub box_type_id: u64,
    pub product_type_id: u64,
    pub box_quantity: u32,
    #[schema(value_type = String, example = "5.00")]
    pub unit_price: Decimal,
    pub created_by: Option<u64>,
}

impl CarretaWash {
    pub fn revenue(&self) -> Decimal {
        Decimal::from(self.box_quantity) * self.unit_price
    }
}

/// Washer 1: dirty boxes priced per box.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct DirtyWasherEntry {
    pub id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub client_id: Option<u64>,
    #[sqlx(try_from = "String")]
    pub wash_kind: WashKind,
    pub box_quantity: u32,
    #[schema(example = "G")]
    pub box_size: String,
    pub product_type_id: u64,
    #[schema(value_type = String, example = "2.50")]
    pub unit_price: Decimal,
    pub created_by: Option<u64>,
}

impl DirtyWasherEntry {
    pub fn revenue(&self) -> Decimal {
        Decimal::from(self.box_quantity) * self.unit_price
    }
}

/// Washer 2: a whole load, counted per size category, billed by the value
/// the load rendered.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CargoWasherEntry {
    pub id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub client_id: Option<u64>,
    #[sqlx(try_from = "String")]
    pub wash_kind: WashKind,
    pub box_quantity: u32,
    pub q_3a: u32,
    pub q_2a: u32,
    pub q_1a: u32,
    pub q_g: u32,
    #[schema(value_type = String, example = "780.00")]
    pub rendered_value: Decimal,
    pub created_by: Option<u64>,
}

impl CargoWasherEntry {
    pub fn revenue(&self) -> Decimal {
        self.rendered_value
    }

    pub fn boxes_by_category(&self) -> u32 {
        self.q_3a + self.q_2a + self.q_1a + self.q_g
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewCarretaWash {
    #[schema(value_type = String, format = "date", example = "2026-03-02")]
    pub date: NaiveDate,
    #[serde(default)]
    pub trailer_ident: String,
    pub client_id: Option<u64>,
    #[serde(default)]
    pub wash_kind: WashKind,
    pub box_type_id: u64,
    pub product_type_id: u64,
    #[serde(default)]
    pub box_quantity: u32,
    #[serde(default, deserialize_with = "lenient::amount")]
    #[schema(value_type = String, example = "5.00")]
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewDirtyWasherEntry {
    #[schema(value_type = String, format = "date", example = "2026-03-02")]
    pub date: NaiveDate,
    pub client_id: Option<u64>,
    #[serde(default)]
    pub wash_kind: WashKind,
    pub box_quantity: u32,
    pub box_size: String,
    pub product_type_id: u64,
    #[serde(default, deserialize_with = "lenient::amount")]
    #[schema(value_type = String, example = "2.50")]
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewCargoWasherEntry {
    #[schema(value_type = String, format = "date", example = "2026-03-02")]
    pub date: NaiveDate,
    pub client_id: Option<u64>,
    #[serde(default = "per_load")]
    pub wash_kind: WashKind,
    pub box_quantity: u32,
    #[serde(default)]
    pub q_3a: u32,
    #[serde(default)]
    pub q_2a: u32,
    #[serde(default)]
    pub q_1a: u32,
    #[serde(default)]
    pub q_g: u32,
    #[serde(default, deserialize_with = "lenient::amount")]
    #[schema(value_type = String, example = "780.00")]
    pub rendered_value: Decimal,
}

fn per_load() -> WashKind {
    WashKind::PerLoad
}

/// Filters shared by the three wash listings.
#[derive(Debug, Clone, Default)]
pub struct WashFilter {
    pub kind: Option<WashKind>,
    pub client_id: Option<u64>,
    /// Substring of the client name.
    pub client_name: Option<String>,
    pub range: Option<DateRange>,
}

impl WashFilter {
    pub fn in_range(range: DateRange) -> Self {
        Self {
            range: Some(range),
            ..Self::default()
        }
    }

    pub fn for_client(client_id: u64) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }
}
