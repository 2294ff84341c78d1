//! Receipt rendering. Produces a minimal single-page PDF summarizing the
//! transaction; no layout engine, just a title and one line per field.

use crate::models::Booking;

pub struct ReceiptData {
    pub client_name: String,
    pub event_type: String,
    pub event_date: String,
    pub venue_name: String,
    /// Cents actually collected.
    pub amount_paid: i64,
    pub payment_method: String,
}

impl ReceiptData {
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            client_name: booking.client_name.clone(),
            event_type: booking.event_type.clone(),
            event_date: booking.event_date.to_string(),
            venue_name: booking.venue_name.clone(),
            amount_paid: booking.paid_amount.unwrap_or(booking.total_amount),
            payment_method: booking
                .payment_method
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

pub fn format_usd(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, (cents % 100).abs())
}

/// Renders the receipt as PDF bytes.
pub fn render_pdf(receipt: &ReceiptData) -> Vec<u8> {
    let lines = [
        format!("Client: {}", receipt.client_name),
        format!("Event Type: {}", receipt.event_type),
        format!("Event Date: {}", receipt.event_date),
        format!("Venue: {}", receipt.venue_name),
        format!("Payment Method: {}", receipt.payment_method),
        format!("Amount Paid: {}", format_usd(receipt.amount_paid)),
    ];

    let mut content = String::new();
    content.push_str("BT\n/F1 20 Tf\n72 720 Td\n(Gigbook Payment Receipt) Tj\n/F1 12 Tf\n");
    content.push_str("0 -36 Td\n");
    for line in &lines {
        content.push_str(&format!("({}) Tj\n0 -18 Td\n", escape_pdf_text(line)));
    }
    content.push_str("ET\n");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
    ];

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );

    out
}

fn escape_pdf_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_receipt() -> ReceiptData {
        ReceiptData {
            client_name: "Alice Smith".to_string(),
            event_type: "Wedding".to_string(),
            event_date: "2026-10-04".to_string(),
            venue_name: "Grand (Main) Hall".to_string(),
            amount_paid: 60_000,
            payment_method: "card".to_string(),
        }
    }

    #[test]
    fn test_renders_valid_pdf_shell() {
        let pdf = render_pdf(&sample_receipt());
        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(pdf.ends_with(b"%%EOF\n"));

        let text = String::from_utf8(pdf).unwrap();
        assert!(text.contains("(Client: Alice Smith) Tj"));
        assert!(text.contains("(Amount Paid: $600.00) Tj"));
        // Parentheses in field values are escaped in the content stream.
        assert!(text.contains("Grand \\(Main\\) Hall"));
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(60_000), "$600.00");
        assert_eq!(format_usd(45_050), "$450.50");
        assert_eq!(format_usd(5), "$0.05");
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(render_pdf(&sample_receipt()), render_pdf(&sample_receipt()));
    }
}
