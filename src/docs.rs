use crate::api::attendance::{AttendanceBatch, AttendanceMark, StatusUpdate};
use crate::api::bonus::{EmployeeEligibility, GrantRequest};
use crate::api::catalog::{CreateBoxType, CreateProductType};
use crate::api::client::{ClientWashReport, CreateClient};
use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::api::financial::LedgerPage;
use crate::api::job_title::CreateJobTitle;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::bonus::{BonusKind, BonusPayment};
use crate::model::catalog::{BoxType, ProductType};
use crate::model::client::Client;
use crate::model::employee::Employee;
use crate::model::financial::{ExpenseBreakdown, FinancialEntry, FinancialInput};
use crate::model::job_title::JobTitle;
use crate::model::user::User;
use crate::model::wash::{
    CargoWasherEntry, CarretaWash, DirtyWasherEntry, NewCargoWasherEntry, NewCarretaWash,
    NewDirtyWasherEntry, WashKind,
};
use crate::models::{LoginReqDto, RegisterReq, TokenPair};
use crate::service::aggregation::{MonthlyRollupRow, PeriodSummary, RevenueBreakdown};
use crate::service::bonus::{BonusSelection, GrantOutcome, SkipReason, SkippedGrant};
use crate::service::eligibility::{Eligibility, RosterEntry};
use crate::service::report::{Dashboard, ReportPeriod};
use crate::service::window::DateRange;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

/// Registers the `bearer_auth` scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Car Wash Management API",
        version = "1.0.0",
        description = r#"
## Car Wash Management System

Back office for a truck and trailer wash business.

### 🔹 Key Features
- **Staff**
  - Job titles, employees with CPF validation, daily attendance
- **Bonuses**
  - Weekly and monthly attendance bonuses, granted in one transaction
- **Operations**
  - Clients, box and product catalogs, three kinds of wash records
- **Finance**
  - Monthly expense ledger, rollups, period reports and CSV exports

### 🔐 Security
Every `/api` endpoint requires a **JWT Bearer** access token from an approved account.
Updates and deletions are restricted to staff accounts.

### 📦 Response Format
- JSON bodies, CSV for the export endpoints
- Monetary values are decimal strings with two places
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,
        crate::auth::handlers::list_pending_users,
        crate::auth::handlers::approve_user,

        crate::api::job_title::list_job_titles,
        crate::api::job_title::create_job_title,
        crate::api::job_title::delete_job_title,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::deactivate_employee,

        crate::api::attendance::register_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance,

        crate::api::bonus::roster,
        crate::api::bonus::employee_eligibility,
        crate::api::bonus::grant,
        crate::api::bonus::list_payments,

        crate::api::client::list_clients,
        crate::api::client::get_client,
        crate::api::client::create_client,
        crate::api::client::update_client,
        crate::api::client::delete_client,
        crate::api::client::client_washes,

        crate::api::catalog::list_box_types,
        crate::api::catalog::create_box_type,
        crate::api::catalog::deactivate_box_type,
        crate::api::catalog::list_product_types,
        crate::api::catalog::create_product_type,
        crate::api::catalog::deactivate_product_type,

        crate::api::wash::list_carreta,
        crate::api::wash::create_carreta,
        crate::api::wash::update_carreta,
        crate::api::wash::delete_carreta,
        crate::api::wash::list_dirty,
        crate::api::wash::create_dirty,
        crate::api::wash::delete_dirty,
        crate::api::wash::list_cargo,
        crate::api::wash::create_cargo,
        crate::api::wash::delete_cargo,
        crate::api::wash::export_washes,

        crate::api::financial::list_entries,
        crate::api::financial::get_entry,
        crate::api::financial::create_entry,
        crate::api::financial::update_entry,
        crate::api::financial::delete_entry,
        crate::api::financial::monthly_rollup,
        crate::api::financial::export_ledger,
        crate::api::financial::export_rollup,

        crate::api::report::period,
        crate::api::report::export_period,
        crate::api::report::dashboard
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            TokenPair,
            User,
            JobTitle,
            CreateJobTitle,
            Employee,
            CreateEmployee,
            EmployeeListResponse,
            AttendanceStatus,
            AttendanceRecord,
            AttendanceMark,
            AttendanceBatch,
            StatusUpdate,
            BonusKind,
            BonusPayment,
            BonusSelection,
            SkipReason,
            SkippedGrant,
            GrantOutcome,
            GrantRequest,
            Eligibility,
            RosterEntry,
            EmployeeEligibility,
            Client,
            CreateClient,
            ClientWashReport,
            BoxType,
            ProductType,
            CreateBoxType,
            CreateProductType,
            WashKind,
            CarretaWash,
            DirtyWasherEntry,
            CargoWasherEntry,
            NewCarretaWash,
            NewDirtyWasherEntry,
            NewCargoWasherEntry,
            ExpenseBreakdown,
            FinancialEntry,
            FinancialInput,
            LedgerPage,
            MonthlyRollupRow,
            DateRange,
            RevenueBreakdown,
            PeriodSummary,
            ReportPeriod,
            Dashboard
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and account approval"),
        (name = "Job title", description = "Job title management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Bonus", description = "Attendance bonus APIs"),
        (name = "Client", description = "Client management APIs"),
        (name = "Catalog", description = "Box and product type APIs"),
        (name = "Wash", description = "Wash record APIs"),
        (name = "Financial", description = "Expense ledger APIs"),
        (name = "Report", description = "Revenue and profit reports"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::PathItemType;

    #[test]
    fn document_lists_protected_paths_with_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/bonus/grant"));
        assert!(doc.paths.paths.contains_key("/api/financial/rollup/export"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn documented_methods_match_the_routes() {
        let doc = ApiDoc::openapi();
        let has = |path: &str, method: PathItemType| {
            doc.paths.get_path_operation(path, method).is_some()
        };
        assert!(has("/api/users/{user_id}/approve", PathItemType::Post));
        assert!(!has("/api/users/{user_id}/approve", PathItemType::Put));
        assert!(has("/api/washes/carreta/{id}", PathItemType::Put));
        assert!(has("/api/washes/export", PathItemType::Get));
        assert!(has("/api/reports/period/export", PathItemType::Get));
    }
}
