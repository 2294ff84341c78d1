use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Booking, BookingStatus, IntentStatus, PaymentIntentRecord, PaymentMethod};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

fn now_str() -> String {
    Utc::now().naive_utc().format(DATETIME_FMT).to_string()
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, client_name, email, phone, event_type, guest_count,
            venue_name, venue_address, event_date, start_time, end_time,
            lighting, photography, video, additional_hours, total_amount,
            payment_method, status, paid_amount, paid_at,
            confirmation_email_sent, receipt_sent, reminder_sent, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                 ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)",
        params![
            booking.id,
            booking.client_name,
            booking.email,
            booking.phone,
            booking.event_type,
            booking.guest_count,
            booking.venue_name,
            booking.venue_address,
            booking.event_date.format(DATE_FMT).to_string(),
            booking.start_time,
            booking.end_time,
            booking.lighting as i32,
            booking.photography as i32,
            booking.video as i32,
            booking.additional_hours,
            booking.total_amount,
            booking.payment_method.map(|m| m.as_str()),
            booking.status.as_str(),
            booking.paid_amount,
            booking.paid_at.map(|t| t.format(DATETIME_FMT).to_string()),
            booking.confirmation_email_sent as i32,
            booking.receipt_sent as i32,
            booking.reminder_sent as i32,
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

const BOOKING_COLUMNS: &str = "id, client_name, email, phone, event_type, guest_count, \
     venue_name, venue_address, event_date, start_time, end_time, \
     lighting, photography, video, additional_hours, total_amount, \
     payment_method, status, paid_amount, paid_at, \
     confirmation_email_sent, receipt_sent, reminder_sent, created_at, updated_at";

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_booking_row(row)));

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Fallback lookup when a payment intent carries no booking back-reference.
/// Only an unambiguous match counts: the most recent non-terminal booking for
/// the pair is returned.
pub fn find_booking_by_email_and_date(
    conn: &Connection,
    email: &str,
    event_date: &NaiveDate,
) -> anyhow::Result<Option<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE email = ?1 AND event_date = ?2 AND status != 'payment_failed'
         ORDER BY created_at DESC LIMIT 1"
    );
    let result = conn.query_row(
        &sql,
        params![email, event_date.format(DATE_FMT).to_string()],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Conditional status transition. When `expected` is given the row is only
/// touched if it currently holds that status; this single UPDATE is the
/// synchronization primitive every state transition goes through.
pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    expected: Option<BookingStatus>,
    new_status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = now_str();
    let count = match expected {
        Some(expected) => conn.execute(
            "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
            params![new_status.as_str(), now, id, expected.as_str()],
        )?,
        None => conn.execute(
            "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![new_status.as_str(), now, id],
        )?,
    };
    Ok(count > 0)
}

/// Atomic paid transition: succeeds only from an awaiting status, so a
/// concurrent webhook and client confirmation cannot both win. Returns false
/// when the row was not in an awaiting state (already paid, still pending,
/// failed, or unknown).
pub fn mark_booking_paid(
    conn: &Connection,
    id: &str,
    method: PaymentMethod,
    amount: i64,
) -> anyhow::Result<bool> {
    let now = now_str();
    let count = conn.execute(
        "UPDATE bookings
         SET status = 'paid', payment_method = ?1, paid_amount = ?2, paid_at = ?3, updated_at = ?3
         WHERE id = ?4 AND status IN ('awaiting_payment', 'awaiting_external_confirmation')",
        params![method.as_str(), amount, now, id],
    )?;
    Ok(count > 0)
}

pub fn set_email_flags(
    conn: &Connection,
    id: &str,
    confirmation_email_sent: bool,
    receipt_sent: bool,
) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE bookings SET confirmation_email_sent = ?1, receipt_sent = ?2, updated_at = ?3
         WHERE id = ?4",
        params![
            confirmation_email_sent as i32,
            receipt_sent as i32,
            now_str(),
            id
        ],
    )?;
    Ok(())
}

pub fn set_reminder_sent(conn: &Connection, id: &str) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE bookings SET reminder_sent = 1, updated_at = ?1 WHERE id = ?2",
        params![now_str(), id],
    )?;
    Ok(())
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1
                 ORDER BY created_at DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC LIMIT ?1"),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Paid bookings whose event falls on `event_date` and which have not been
/// reminded yet.
pub fn find_reminder_candidates(
    conn: &Connection,
    event_date: &NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE event_date = ?1 AND status = 'paid' AND reminder_sent = 0
         ORDER BY created_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![event_date.format(DATE_FMT).to_string()], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let client_name: String = row.get(1)?;
    let email: String = row.get(2)?;
    let phone: String = row.get(3)?;
    let event_type: String = row.get(4)?;
    let guest_count: i32 = row.get(5)?;
    let venue_name: String = row.get(6)?;
    let venue_address: String = row.get(7)?;
    let event_date_str: String = row.get(8)?;
    let start_time: String = row.get(9)?;
    let end_time: String = row.get(10)?;
    let lighting: bool = row.get::<_, i32>(11)? != 0;
    let photography: bool = row.get::<_, i32>(12)? != 0;
    let video: bool = row.get::<_, i32>(13)? != 0;
    let additional_hours: i32 = row.get(14)?;
    let total_amount: i64 = row.get(15)?;
    let payment_method_str: Option<String> = row.get(16)?;
    let status_str: String = row.get(17)?;
    let paid_amount: Option<i64> = row.get(18)?;
    let paid_at_str: Option<String> = row.get(19)?;
    let confirmation_email_sent: bool = row.get::<_, i32>(20)? != 0;
    let receipt_sent: bool = row.get::<_, i32>(21)? != 0;
    let reminder_sent: bool = row.get::<_, i32>(22)? != 0;
    let created_at_str: String = row.get(23)?;
    let updated_at_str: String = row.get(24)?;

    let event_date = NaiveDate::parse_from_str(&event_date_str, DATE_FMT)
        .unwrap_or_else(|_| Utc::now().date_naive());
    let paid_at =
        paid_at_str.and_then(|s| NaiveDateTime::parse_from_str(&s, DATETIME_FMT).ok());
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id,
        client_name,
        email,
        phone,
        event_type,
        guest_count,
        venue_name,
        venue_address,
        event_date,
        start_time,
        end_time,
        lighting,
        photography,
        video,
        additional_hours,
        total_amount,
        payment_method: payment_method_str.as_deref().and_then(PaymentMethod::parse),
        status: BookingStatus::parse(&status_str),
        paid_amount,
        paid_at,
        confirmation_email_sent,
        receipt_sent,
        reminder_sent,
        created_at,
        updated_at,
    })
}

// ── Payment Intents ──

pub fn create_intent(conn: &Connection, intent: &PaymentIntentRecord) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO payment_intents (id, booking_id, amount, currency, status,
            client_name, email, event_type, event_date, venue_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            intent.id,
            intent.booking_id,
            intent.amount,
            intent.currency,
            intent.status.as_str(),
            intent.client_name,
            intent.email,
            intent.event_type,
            intent.event_date,
            intent.venue_name,
            intent.created_at.format(DATETIME_FMT).to_string(),
            intent.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_intent_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<PaymentIntentRecord>> {
    let result = conn.query_row(
        "SELECT id, booking_id, amount, currency, status, client_name, email,
                event_type, event_date, venue_name, created_at, updated_at
         FROM payment_intents WHERE id = ?1",
        params![id],
        |row| {
            let created_at_str: String = row.get(10)?;
            let updated_at_str: String = row.get(11)?;
            Ok(PaymentIntentRecord {
                id: row.get(0)?,
                booking_id: row.get(1)?,
                amount: row.get(2)?,
                currency: row.get(3)?,
                status: IntentStatus::parse(&row.get::<_, String>(4)?),
                client_name: row.get(5)?,
                email: row.get(6)?,
                event_type: row.get(7)?,
                event_date: row.get(8)?,
                venue_name: row.get(9)?,
                created_at: NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
                    .unwrap_or_else(|_| Utc::now().naive_utc()),
                updated_at: NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FMT)
                    .unwrap_or_else(|_| Utc::now().naive_utc()),
            })
        },
    );

    match result {
        Ok(intent) => Ok(Some(intent)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_intent_status(conn: &Connection, id: &str, status: IntentStatus) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE payment_intents SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now_str(), id],
    )?;
    Ok(count > 0)
}
