//! Bonus issuing.
//!
//! Every grant re-evaluates eligibility against the ledger at the moment of
//! the request; flags shown earlier on the roster screen are not trusted.
//! Payments from one grant are written in a single transaction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::bonus::{BonusKind, BonusPayment, NewBonusPayment};
use crate::repository::{AttendanceRepository, BonusRepository, EmployeeRepository};
use crate::service::eligibility::EligibilityEvaluator;

/// What the operator ticked for one employee.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BonusSelection {
    pub employee_id: u64,
    #[serde(default)]
    pub grant_weekly: bool,
    #[serde(default)]
    pub grant_monthly: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// At least one absence inside the window.
    Absences,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SkippedGrant {
    pub employee_id: u64,
    pub kind: BonusKind,
    pub reason: SkipReason,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GrantOutcome {
    #[schema(value_type = String, format = "date")]
    pub reference_date: NaiveDate,
    pub created: Vec<BonusPayment>,
    pub skipped: Vec<SkippedGrant>,
}

pub struct BonusIssuer<'a, R> {
    repo: &'a R,
}

impl<'a, R> BonusIssuer<'a, R>
where
    R: EmployeeRepository + AttendanceRepository + BonusRepository,
{
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Issues the selected bonuses the employees are still eligible for.
    ///
    /// An unknown employee aborts the whole grant before anything is written.
    /// Earlier grants are not consulted, so repeating a grant pays twice.
    pub async fn grant_bonuses(
        &self,
        selections: &[BonusSelection],
        issued_by: Option<u64>,
        reference: NaiveDate,
    ) -> Result<GrantOutcome, AppError> {
        let evaluator = EligibilityEvaluator::new(self.repo);
        let mut pending = Vec::new();
        let mut skipped = Vec::new();

        for selection in selections {
            let employee = self
                .repo
                .find_employee(selection.employee_id)
                .await?
                .ok_or_else(|| AppError::not_found("Employee", selection.employee_id))?;

            let requested = [
                (selection.grant_weekly, BonusKind::WeeklyBonus),
                (selection.grant_monthly, BonusKind::MonthlyBasket),
            ];

            for (wanted, kind) in requested {
                if !wanted {
                    continue;
                }
                if !employee.active {
                    skipped.push(SkippedGrant {
                        employee_id: employee.id,
                        kind,
                        reason: SkipReason::Inactive,
                    });
                    continue;
                }

                let eligibility = match kind {
                    BonusKind::WeeklyBonus => {
                        evaluator.evaluate_weekly(employee.id, reference).await?
                    }
                    BonusKind::MonthlyBasket => {
                        evaluator.evaluate_monthly(employee.id, reference).await?
                    }
                };

                if eligibility.eligible {
                    pending.push(NewBonusPayment::issue(employee.id, kind, issued_by));
                } else {
                    debug!(
                        employee_id = employee.id,
                        %kind,
                        absent = eligibility.absent,
                        "Bonus skipped for absences"
                    );
                    skipped.push(SkippedGrant {
                        employee_id: employee.id,
                        kind,
                        reason: SkipReason::Absences,
                    });
                }
            }
        }

        let created = if pending.is_empty() {
            Vec::new()
        } else {
            self.repo.insert_bonus_batch(&pending).await?
        };

        info!(
            %reference,
            created = created.len(),
            skipped = skipped.len(),
            "Bonus grant finished"
        );

        Ok(GrantOutcome {
            reference_date: reference,
            created,
            skipped,
        })
    }
}
