use std::sync::Arc;

use crate::models::Booking;
use crate::services::mail::{Mailer, OutgoingMail};

/// Fire-and-forget booking mail. Nothing here can fail a booking: every send
/// runs on its own task and errors are only logged.
#[derive(Clone)]
pub struct Notifier {
    mailer: Option<Arc<dyn Mailer>>,
    admin_email: String,
    apartment_name: String,
    daily_rate: i64,
}

impl Notifier {
    pub fn new(
        mailer: Option<Arc<dyn Mailer>>,
        admin_email: String,
        apartment_name: String,
        daily_rate: i64,
    ) -> Self {
        Self {
            mailer,
            admin_email,
            apartment_name,
            daily_rate,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, String::new(), String::new(), 0)
    }

    fn total_price(&self, booking: &Booking) -> i64 {
        crate::models::dates::days_inclusive(booking.start_date, booking.end_date) * self.daily_rate
    }

    pub fn booking_confirmed(&self, booking: &Booking) {
        let total = self.total_price(booking);
        let dates = format_dates(booking);

        let html = format!(
            "<div style=\"font-family:Arial,sans-serif;max-width:600px;margin:auto;padding:20px;\">\
             <h2>Booking confirmation: {apartment}</h2>\
             <p>Hi <strong>{name}</strong>,</p>\
             <p>Your booking is confirmed for:</p>\
             <p><strong>{dates}</strong></p>\
             <p><strong>Total:</strong> {total} SEK ({rate} SEK per day)</p>\
             <p>Thank you for your booking!</p></div>",
            apartment = self.apartment_name,
            name = booking.name,
            rate = self.daily_rate,
        );
        let text = format!(
            "Hi {},\n\nYour booking of {} is confirmed for {dates}.\nTotal: {total} SEK ({} SEK per day)\n",
            booking.name, self.apartment_name, self.daily_rate,
        );

        self.send(OutgoingMail {
            to: booking.email.clone(),
            subject: format!("Booking confirmation: {}", self.apartment_name),
            text,
            html: Some(html),
        });
        self.send_admin("New booking confirmed", admin_summary(booking, total));
    }

    pub fn manual_booking(&self, booking: &Booking) {
        let total = self.total_price(booking);
        self.send_admin("New manual booking", admin_summary(booking, total));
    }

    fn send_admin(&self, subject: &str, text: String) {
        if self.admin_email.is_empty() {
            tracing::warn!("ADMIN_EMAIL not configured, skipping admin notification");
            return;
        }
        self.send(OutgoingMail {
            to: self.admin_email.clone(),
            subject: subject.to_string(),
            text,
            html: None,
        });
    }

    fn send(&self, mail: OutgoingMail) {
        let Some(mailer) = self.mailer.clone() else {
            tracing::warn!(to = %mail.to, subject = %mail.subject, "mail not configured, skipping");
            return;
        };

        tokio::spawn(async move {
            if let Err(e) = mailer.send_mail(&mail).await {
                tracing::error!(error = %e, to = %mail.to, "failed to send mail");
            }
        });
    }
}

fn format_dates(booking: &Booking) -> String {
    format!(
        "{} – {}",
        booking.start_date.format("%d-%m-%Y"),
        booking.end_date.format("%d-%m-%Y")
    )
}

fn admin_summary(booking: &Booking, total: i64) -> String {
    format!(
        "Name: {}\nDates: {} – {}\nPhone: {}\nEmail: {}\nTotal: {total} SEK",
        booking.name, booking.start_date, booking.end_date, booking.phone, booking.email,
    )
}
