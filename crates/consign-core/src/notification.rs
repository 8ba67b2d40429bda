//! Composition of the brokerage notification for an accepted submission.

use crate::config::IntakeSettings;
use crate::models::Submission;
use crate::tracking::TrackingId;
use crate::validation::{format_thousands, parse_price, sanitize_email};

const RULE: &str = "-----------------------------------";

/// A fully composed plain-text notification, ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEmail {
    pub recipient: String,
    /// Sanitized consignor address; `None` when nothing usable remains
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

impl NotificationEmail {
    pub fn compose(
        settings: &IntakeSettings,
        tracking_id: &TrackingId,
        submission: &Submission,
        stored_path: &str,
    ) -> Self {
        let consignor_email = sanitize_email(submission.email());

        let subject = format!(
            "ASSET INTAKE | ID: {} | {} by {}",
            tracking_id,
            submission.artwork_title(),
            submission.artist_name()
        );

        let body = format!(
            "A new conceptual art asset has been submitted (ID: {id}).\n\n\
             {RULE}\n\
             ASSET VALUE & DETAILS:\n\
             Desired Price: ${price}\n\
             Artist: {artist}\n\
             Title: {title}\n\
             Medium: {medium}\n\
             COA Status: {coa}\n\
             File Location on Server: Primary Image: {stored_path}\n\n\
             CONSIGNOR CONTACT:\n\
             Name: {consignor}\n\
             Email: {consignor_email}\n\
             Phone: {phone}\n\
             Discretionary Notes:\n{notes}\n\
             {RULE}\n",
            id = tracking_id,
            price = format_thousands(parse_price(submission.desired_price())),
            artist = submission.artist_name(),
            title = submission.artwork_title(),
            medium = submission.medium_materials(),
            coa = submission.coa_status(),
            consignor = submission.consignor_name(),
            phone = submission.phone().unwrap_or("N/A"),
            notes = submission.discretionary_notes(),
        );

        Self {
            recipient: settings.recipient.clone(),
            reply_to: Some(consignor_email).filter(|e| !e.is_empty()),
            subject,
            body,
        }
    }
}
