//! Next-period prediction command

use anyhow::Result;
use chrono::{Local, NaiveDate};
use colored::Colorize;

use crate::client::ApiClient;
use crate::output::{print_heading, print_json, print_success, print_warning, OutputFormat};

/// Predict the next period for a user's screening
pub async fn predict_period(
    client: &ApiClient,
    user_id: &str,
    screening_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let result = client.predict_period(user_id, screening_id).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_heading("Next Period Prediction");
            println!("User:                   {}", user_id.cyan());
            println!("Screening:              {}", screening_id.cyan());
            println!();

            match &result.predicted_date {
                Some(date) => {
                    print_success(&format!("Predicted start: {}", date.green().bold()));
                    if let Some(days) = days_until(date, Local::now().date_naive()) {
                        println!("{}", describe_days(days));
                    }
                }
                None => print_warning(
                    result
                        .message
                        .as_deref()
                        .unwrap_or("No prediction available"),
                ),
            }
        }
    }

    Ok(())
}

fn days_until(date: &str, today: NaiveDate) -> Option<i64> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| (d - today).num_days())
}

fn describe_days(days: i64) -> String {
    match days {
        0 => "Expected today".to_string(),
        1 => "Expected tomorrow".to_string(),
        d if d > 1 => format!("Expected in {} days", d),
        d => format!("Expected {} days ago", -d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_until() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 20).unwrap();
        assert_eq!(days_until("2026-03-05", today), Some(13));
        assert_eq!(days_until("2026-02-18", today), Some(-2));
        assert_eq!(days_until("March 5th", today), None);
    }

    #[test]
    fn test_describe_days() {
        assert_eq!(describe_days(0), "Expected today");
        assert_eq!(describe_days(1), "Expected tomorrow");
        assert_eq!(describe_days(13), "Expected in 13 days");
        assert_eq!(describe_days(-2), "Expected 2 days ago");
    }
}
