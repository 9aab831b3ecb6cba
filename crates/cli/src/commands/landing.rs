//! Landing summary command

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, Landing};
use crate::output::{color_status, or_dash, print_heading, print_info, print_json, OutputFormat};

/// Row for the landing summary table
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Show the landing page summary for a user
pub async fn show_landing(client: &ApiClient, user_id: &str, format: OutputFormat) -> Result<()> {
    let landing = client.landing(user_id).await?;

    match format {
        OutputFormat::Json => print_json(&landing)?,
        OutputFormat::Table => {
            print_heading("Landing Summary");
            let name = landing.profile.as_ref().and_then(|p| p.name.as_deref());
            println!("User:                   {}", user_id.cyan());
            println!("Name:                   {}", or_dash(name));
            let reminder = landing
                .preferences
                .as_ref()
                .and_then(|p| p.reminder_time.as_deref());
            println!("Reminder:               {}", or_dash(reminder));
            println!();

            let rows = summary_rows(&landing);
            if rows.is_empty() {
                print_info("No landing summary recorded yet");
                return Ok(());
            }

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}

fn summary_rows(landing: &Landing) -> Vec<SummaryRow> {
    let Some(summary) = &landing.landing_page_summary else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    let mut push = |item: &str, value: String| {
        rows.push(SummaryRow {
            item: item.to_string(),
            value,
        })
    };

    if let Some(risk) = &summary.risk {
        push("Risk level", color_status(&or_dash(risk.level.as_deref())));
        if let Some(score) = risk.score {
            push("Risk score", score.to_string());
        }
    }
    if let Some(journey) = &summary.heal_journey {
        push("Heal journey", journey.clone());
    }
    if let Some(yoga) = &summary.next_yoga {
        push("Next yoga", yoga.clone());
    }
    if let Some(cycle) = &summary.cycle {
        push(
            "Last period",
            format!(
                "{} to {}",
                or_dash(cycle.last_period_start.as_deref()),
                or_dash(cycle.last_period_end.as_deref())
            ),
        );
    }
    if let Some(status) = summary.pad_usage.as_ref().and_then(|p| p.status.as_deref()) {
        push("Pad usage", status.to_string());
    }

    rows
}
