use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    /// An expected business rejection. `reason` is the stable
    /// machine-checkable cause; `message` is free text for humans.
    #[error("{message}")]
    Rejected { reason: &'static str, message: String },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn rejected(reason: &'static str, message: impl Into<String>) -> Self {
        AppError::Rejected {
            reason,
            message: message.into(),
        }
    }
}

/// All error responses share the success envelope so clients can branch on
/// `reason` without parsing the message text.
fn envelope(status: StatusCode, reason: &str, message: &str) -> axum::response::Response {
    (
        status,
        Json(json!({
            "success": false,
            "message": message,
            "reason": reason,
            "data": null,
        })),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match &self {
            AppError::Unauthorized => {
                envelope(StatusCode::UNAUTHORIZED, "unauthorized", &self.to_string())
            }
            AppError::Forbidden => {
                envelope(StatusCode::FORBIDDEN, "forbidden", &self.to_string())
            }
            AppError::NotFound(msg) => envelope(StatusCode::NOT_FOUND, "not found", msg),
            AppError::Rejected { reason, message } => {
                envelope(StatusCode::BAD_REQUEST, reason, message)
            }
            AppError::Validation(e) => {
                let messages: Vec<String> = e
                    .field_errors()
                    .into_iter()
                    .map(|(field, errors)| {
                        let msgs: Vec<&str> = errors
                            .iter()
                            .filter_map(|err| err.message.as_ref().map(|m| m.as_ref()))
                            .collect();
                        if msgs.is_empty() {
                            let codes: Vec<&str> =
                                errors.iter().map(|err| err.code.as_ref()).collect();
                            format!("{}: {}", field, codes.join(", "))
                        } else {
                            format!("{}: {}", field, msgs.join(", "))
                        }
                    })
                    .collect();
                envelope(
                    StatusCode::BAD_REQUEST,
                    "validation error",
                    &messages.join("; "),
                )
            }
            AppError::Database(e) => {
                // Constraint violations are expected business outcomes; map
                // them onto the same stable reasons the admission checks use.
                if let sqlx::Error::Database(db_err) = e {
                    let constraint = db_err.constraint().unwrap_or_default();
                    match db_err.code().as_deref() {
                        // exclusion_violation: the overlap backstop fired
                        Some("23P01") if constraint == "bookings_no_overlap" => {
                            tracing::warn!("Booking overlap caught by exclusion constraint");
                            return envelope(
                                StatusCode::BAD_REQUEST,
                                "time conflict",
                                "Requested time range conflicts with an existing booking",
                            );
                        }
                        // unique_violation
                        Some("23505") => {
                            tracing::warn!("Unique constraint violation: {}", db_err.message());
                            let (reason, message) = match constraint {
                                "staff_facility_assignments_staff_id_facility_id_key" => (
                                    "duplicate assignment",
                                    "Staff member is already assigned to this facility",
                                ),
                                "facility_ratings_facility_id_resident_id_key" => (
                                    "duplicate rating",
                                    "Resident has already rated this facility",
                                ),
                                _ => ("duplicate", "A record with that value already exists"),
                            };
                            return envelope(StatusCode::BAD_REQUEST, reason, message);
                        }
                        // foreign_key_violation
                        Some("23503") => {
                            tracing::warn!("Foreign key violation: {}", db_err.message());
                            return envelope(
                                StatusCode::BAD_REQUEST,
                                "invalid reference",
                                "Referenced record does not exist",
                            );
                        }
                        _ => {}
                    }
                }
                tracing::error!("Database error: {:?}", e);
                envelope(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error",
                    "Database error",
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                envelope(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error",
                    "Internal server error",
                )
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
