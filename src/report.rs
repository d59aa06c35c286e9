//! Text rendering of a result snapshot — per-manager tables, totals, and a
//! flat card listing.

use crate::crm::types::Card;
use crate::pipeline::aggregate::{Analytics, MetricCell};
use crate::pipeline::classify::Category;
use crate::pipeline::snapshot::ResultSnapshot;

/// Column headers of the analytics table (the CRM operates in Ukrainian).
const HEADERS: [&str; 9] = [
    "Категорія",
    "Нові Прогріті",
    "Нові Не прогріті",
    "Попередні Прогріті",
    "Попередні Не прогріті",
    "Не кваліфіковані",
    "Закр. Зустріч КИЇВ",
    "Закр. Навчання В ЗАПИСІ",
    "Закр. Зустріч ONLINE",
];

/// Label of the per-manager totals row.
const TOTALS_LABEL: &str = "Всього";

/// Render the full report for one snapshot.
pub fn render(snapshot: &ResultSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Звіт за {} — {} карток\n\n",
        snapshot.processing_date, snapshot.count
    ));

    for manager in snapshot.analytics.by_manager.keys() {
        out.push_str(&render_manager_table(manager, &snapshot.analytics));
        out.push('\n');
    }

    let grand = snapshot.analytics.grand_total();
    out.push_str(&format!(
        "Всього (всі менеджери): {}\n\n",
        totals_line(&grand)
    ));

    out.push_str(&render_card_listing(&snapshot.cards));
    out
}

/// One manager's table: a row per category (zeros for absent categories)
/// plus a totals row.
pub fn render_manager_table(manager: &str, analytics: &Analytics) -> String {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(Category::ALL.len() + 1);
    for category in Category::ALL {
        // Absent categories render as zero rows; the aggregate itself does
        // not pre-populate them.
        let cell = analytics.cell(manager, category);
        rows.push(metric_row(category.label(), &cell));
    }
    rows.push(metric_row(TOTALS_LABEL, &analytics.manager_total(manager)));

    format!("{manager}\n{}", render_table(&HEADERS, &rows))
}

fn metric_row(label: &str, cell: &MetricCell) -> Vec<String> {
    vec![
        label.to_string(),
        cell.new_warm.to_string(),
        cell.new_cold.to_string(),
        cell.prior_warm.to_string(),
        cell.prior_cold.to_string(),
        cell.not_qualified.to_string(),
        cell.closed_meeting_kyiv.to_string(),
        cell.closed_training_recorded.to_string(),
        cell.closed_meeting_online.to_string(),
    ]
}

fn totals_line(cell: &MetricCell) -> String {
    format!(
        "нові {}/{}, попередні {}/{}, не кваліфіковані {}, закриття {}/{}/{}",
        cell.new_warm,
        cell.new_cold,
        cell.prior_warm,
        cell.prior_cold,
        cell.not_qualified,
        cell.closed_meeting_kyiv,
        cell.closed_training_recorded,
        cell.closed_meeting_online,
    )
}

/// Flat listing of all reconciled cards.
pub fn render_card_listing(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "Картки відсутні\n".to_string();
    }

    let headers = ["ID", "Назва", "Контакт", "Телефон", "Менеджер", "Створено"];
    let rows: Vec<Vec<String>> = cards
        .iter()
        .map(|card| {
            let manager = card
                .manager
                .as_ref()
                .and_then(|m| m.full_name.clone())
                .unwrap_or_else(|| crate::pipeline::aggregate::manager_key(card));
            let contact = card.contact.as_ref();
            vec![
                card.id.to_string(),
                card.title.clone().unwrap_or_else(|| "N/A".into()),
                contact
                    .and_then(|c| c.full_name.clone())
                    .unwrap_or_else(|| "N/A".into()),
                contact
                    .and_then(|c| c.phone.clone())
                    .unwrap_or_else(|| "N/A".into()),
                manager,
                card.created_at.clone().unwrap_or_else(|| "N/A".into()),
            ]
        })
        .collect();

    render_table(&headers, &rows)
}

/// Render rows under headers with per-column alignment.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(cols) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    render_row(&mut out, headers.iter().map(|h| h.to_string()), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    render_row(&mut out, rule.into_iter(), &widths);
    for row in rows {
        render_row(&mut out, row.iter().cloned(), &widths);
    }
    out
}

fn render_row(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}
