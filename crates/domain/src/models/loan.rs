//! Loan ledger models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A borrow record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub user_id: i64,
    pub item_id: i64,
    pub quantity: i32,
    pub borrow_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub returned: bool,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && now > self.expected_return_date
    }

    /// Whole days until the expected return, negative once overdue.
    pub fn days_until_return(&self, now: DateTime<Utc>) -> i64 {
        (self.expected_return_date - now).num_days()
    }
}

/// Insert payload for a borrow record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub user_id: i64,
    pub item_id: i64,
    pub quantity: i32,
    pub borrow_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
}

/// Loan joined with borrower and item details.
#[derive(Debug, Clone, Serialize)]
pub struct LoanView {
    #[serde(flatten)]
    pub loan: Loan,
    pub user_name: String,
    pub item_name: String,
    pub is_temporary: bool,
    pub location_info: String,
    pub is_overdue: bool,
    pub days_until_return: i64,
}

impl LoanView {
    pub fn new(
        loan: Loan,
        user_name: String,
        item_name: String,
        is_temporary: bool,
        location_info: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            is_overdue: loan.is_overdue(now),
            days_until_return: loan.days_until_return(now),
            loan,
            user_name,
            item_name,
            is_temporary,
            location_info,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListLoansQuery {
    pub user_id: Option<i64>,
    #[serde(default)]
    pub active_only: bool,
}

fn default_quantity() -> i32 {
    1
}

/// One entry of a borrow request as sent by clients.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoanItemInput {
    pub id: Option<i64>,

    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    #[serde(rename = "isTemporary", default)]
    pub is_temporary: bool,

    #[serde(default)]
    pub name: String,
}

/// Borrow request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLoanRequest {
    #[validate(length(min = 1, message = "No items selected"), nested)]
    pub items: Vec<LoanItemInput>,

    pub return_date: String,
}

impl CreateLoanRequest {
    /// Converts the payload into a service request, rejecting it as a whole
    /// when any entry is malformed. A permanent entry without an id is kept
    /// and fails on its own as an unknown item.
    pub fn into_loan_request(
        self,
        max_items: usize,
        max_name_length: usize,
    ) -> Result<LoanRequest, String> {
        if self.items.len() > max_items {
            return Err(format!("At most {} items per request", max_items));
        }
        let expected_return_date = parse_return_date(&self.return_date)?;

        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(index, input)| {
                if input.quantity < 1 {
                    return Err(format!("Item {}: quantity must be at least 1", index + 1));
                }
                let name = input.name.trim().to_string();
                if input.is_temporary {
                    if name.is_empty() {
                        return Err(format!("Item {}: temporary items need a name", index + 1));
                    }
                    if name.chars().count() > max_name_length {
                        return Err(format!(
                            "Item {}: name exceeds {} characters",
                            index + 1,
                            max_name_length
                        ));
                    }
                    Ok(LoanItemRequest::Temporary {
                        name,
                        quantity: input.quantity,
                    })
                } else {
                    Ok(LoanItemRequest::Existing {
                        item_id: input.id,
                        name,
                        quantity: input.quantity,
                    })
                }
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(LoanRequest {
            items,
            expected_return_date,
        })
    }
}

/// Accepts RFC 3339, a naive ISO-8601 date-time (read as UTC), or a bare date.
pub fn parse_return_date(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Expected return date is required".to_string());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("Invalid date format: {}", value))
}

/// A validated borrow request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanRequest {
    pub items: Vec<LoanItemRequest>,
    pub expected_return_date: DateTime<Utc>,
}

/// One requested line of a borrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanItemRequest {
    /// Borrow from an existing item. `name` is the client's label, echoed on failure.
    Existing {
        item_id: Option<i64>,
        name: String,
        quantity: i32,
    },
    /// Create a temporary item holding exactly the borrowed quantity.
    Temporary { name: String, quantity: i32 },
}

impl LoanItemRequest {
    pub fn quantity(&self) -> i32 {
        match self {
            LoanItemRequest::Existing { quantity, .. } | LoanItemRequest::Temporary { quantity, .. } => {
                *quantity
            }
        }
    }

    /// Id of the existing item this line borrows from.
    pub fn item_id(&self) -> Option<i64> {
        match self {
            LoanItemRequest::Existing { item_id, .. } => *item_id,
            LoanItemRequest::Temporary { .. } => None,
        }
    }
}
