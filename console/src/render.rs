//! Plain-text tables, boards and pagination footers for stdout.

use std::fmt::Write as _;

use entity::{
    Choice, KanbanRecord, account, calendar_event, campaign, carepack, contact, deal, email,
    email_template, lead, partner, product, task, ticket, user,
};
use products_crm::{KanbanBoard, PageItem, Pager};

/// A record that can be shown as one table row.
pub trait Row {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

pub fn money(cents: Option<i64>, currency: Option<&str>) -> String {
    let Some(cents) = cents else {
        return String::new();
    };
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let amount = format!("{sign}{}.{:02}", abs / 100, abs % 100);
    match currency {
        Some(code) => format!("{amount} {code}"),
        None => amount,
    }
}

pub fn percent(rate: Option<f64>) -> String {
    rate.map_or_else(|| "-".to_string(), |r| format!("{:.1}%", r * 100.0))
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

pub fn table<R: Row>(rows: &[R]) -> String {
    let body: Vec<Vec<String>> = rows.iter().map(Row::cells).collect();
    let mut widths: Vec<usize> = R::HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let mut out = String::new();
    let header: Vec<String> = R::HEADERS.iter().map(|h| h.to_uppercase()).collect();
    push_line(&mut out, &header, &widths);
    for row in &body {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// `Showing 21-40 of 95   1 2 [3] 4 5 ... 10`
pub fn footer(pager: &Pager) -> String {
    let Some((first, last)) = pager.showing() else {
        return "No records".to_string();
    };
    let window = pager
        .window(1)
        .into_iter()
        .map(|item| match item {
            PageItem::Page(n) if n == pager.page() => format!("[{n}]"),
            PageItem::Page(n) => n.to_string(),
            PageItem::Ellipsis => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("Showing {first}-{last} of {}   {window}", pager.total())
}

pub fn board<R: KanbanRecord>(board: &KanbanBoard<R>) -> String {
    let mut out = String::new();
    for column in board.columns() {
        let amount = column.amount_cents();
        let _ = write!(out, "== {} ({})", column.status().as_str(), column.total());
        if amount != 0 {
            let _ = write!(out, "  {}", money(Some(amount), None));
        }
        out.push('\n');
        if let Some(err) = column.error() {
            let _ = writeln!(out, "   ! {err}");
        }
        for item in column.items() {
            let _ = writeln!(out, "   {}  {}", item.id(), item.title());
        }
        if column.has_more() {
            let loaded = column.items().len() as u64;
            let _ = writeln!(out, "   ... {} more", column.total().saturating_sub(loaded));
        }
    }
    let _ = write!(out, "{} cards", board.total_count());
    let total = board.total_amount_cents();
    if total != 0 {
        let _ = write!(out, ", {} on the loaded cards", money(Some(total), None));
    }
    out.push('\n');
    out
}

impl Row for account::Model {
    const HEADERS: &'static [&'static str] = &["id", "name", "status", "industry", "revenue"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.status.to_string(),
            opt(&self.industry),
            money(self.annual_revenue_cents, self.currency.as_deref()),
        ]
    }
}

impl Row for contact::Model {
    const HEADERS: &'static [&'static str] = &["id", "name", "email", "job title"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.full_name(),
            opt(&self.email),
            opt(&self.job_title),
        ]
    }
}

impl Row for lead::Model {
    const HEADERS: &'static [&'static str] = &["id", "name", "company", "status", "value"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            opt(&self.company),
            self.status.to_string(),
            money(self.value_cents, None),
        ]
    }
}

impl Row for deal::Model {
    const HEADERS: &'static [&'static str] = &["id", "title", "stage", "amount", "close"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            format!("{} ({}%)", self.stage, self.stage.probability()),
            money(self.amount_cents, self.currency.as_deref()),
            self.close_date.map(|d| d.to_string()).unwrap_or_default(),
        ]
    }
}

impl Row for carepack::Model {
    const HEADERS: &'static [&'static str] = &["id", "name", "status", "start", "end", "serial"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.status.to_string(),
            self.start_date.to_string(),
            self.end_date.to_string(),
            opt(&self.serial_number),
        ]
    }
}

impl Row for email::Model {
    const HEADERS: &'static [&'static str] = &["id", "to", "subject", "status", "sent"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.to.clone(),
            self.subject.clone(),
            self.status.to_string(),
            self.sent_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        ]
    }
}

impl Row for email_template::Model {
    const HEADERS: &'static [&'static str] = &["id", "name", "subject"];

    fn cells(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone(), self.subject.clone()]
    }
}

impl Row for calendar_event::Model {
    const HEADERS: &'static [&'static str] = &["id", "title", "kind", "starts", "ends", "location"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.kind.to_string(),
            self.starts_at.format("%Y-%m-%d %H:%M").to_string(),
            self.ends_at.format("%H:%M").to_string(),
            opt(&self.location),
        ]
    }
}

impl Row for campaign::Model {
    const HEADERS: &'static [&'static str] = &["id", "name", "status", "sent", "opens", "clicks"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.status.to_string(),
            self.sent_count.to_string(),
            self.open_count.to_string(),
            self.click_count.to_string(),
        ]
    }
}

impl Row for task::Model {
    const HEADERS: &'static [&'static str] = &["id", "title", "status", "priority", "due"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.status.to_string(),
            self.priority.to_string(),
            self.due_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        ]
    }
}

impl Row for ticket::Model {
    const HEADERS: &'static [&'static str] = &["id", "subject", "status", "priority"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.subject.clone(),
            self.status.to_string(),
            self.priority.to_string(),
        ]
    }
}

impl Row for partner::Model {
    const HEADERS: &'static [&'static str] = &["id", "name", "kind", "email"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            opt(&self.kind),
            opt(&self.email),
        ]
    }
}

impl Row for product::Model {
    const HEADERS: &'static [&'static str] = &["id", "name", "sku", "price", "active"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            opt(&self.sku),
            money(Some(self.price_cents), self.currency.as_deref()),
            if self.active { "yes" } else { "no" }.to_string(),
        ]
    }
}

impl Row for user::Model {
    const HEADERS: &'static [&'static str] = &["id", "email", "name", "role", "active"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.email.clone(),
            opt(&self.display_name),
            self.role.to_string(),
            if self.is_active { "yes" } else { "no" }.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_keeps_two_decimals() {
        assert_eq!(money(Some(123_456), Some("EUR")), "1234.56 EUR");
        assert_eq!(money(Some(-5), None), "-0.05");
        assert_eq!(money(None, Some("EUR")), "");
    }

    #[test]
    fn footer_marks_current_page() {
        let mut pager = Pager::new(10);
        pager.set_total(95);
        pager.go_to(5);
        assert_eq!(
            footer(&pager),
            "Showing 41-50 of 95   1 ... 4 [5] 6 ... 10"
        );
        assert_eq!(footer(&Pager::new(10)), "No records");
    }
}
