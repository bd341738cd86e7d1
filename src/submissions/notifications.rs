//! Notification and confirmation emails for accepted submissions.

use ammonia::clean_text;

use crate::config::EmailConfig;
use crate::models::Submission;
use crate::services::OutgoingEmail;

fn row(label: &str, value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    format!(
        "<tr><td style=\"padding:4px 12px 4px 0\"><strong>{}</strong></td><td>{}</td></tr>",
        label,
        clean_text(value)
    )
}

/// Mail to the site operator describing the new submission.
pub fn operator_notification(config: &EmailConfig, submission: &Submission) -> OutgoingEmail {
    let mut rows = [
        row("Name", &submission.name),
        row("Email", &submission.email),
        row("Phone", &submission.phone),
        row("Company", &submission.company),
        row("Service", &submission.service),
        row("Timeline", &submission.timeline),
    ]
    .concat();

    if let (Some(url), Some(file_name)) = (&submission.resume_url, &submission.resume_file_name) {
        rows.push_str(&format!(
            "<tr><td style=\"padding:4px 12px 4px 0\"><strong>Resume</strong></td><td><a href=\"{}\">{}</a></td></tr>",
            clean_text(url),
            clean_text(file_name)
        ));
    }

    let html = format!(
        "<h2>New contact form submission</h2>\
         <table>{rows}</table>\
         <h3>Message</h3>\
         <p style=\"white-space:pre-wrap\">{message}</p>\
         <p style=\"color:#888;font-size:12px\">Submission {id} from {ip}</p>",
        message = clean_text(&submission.message),
        id = clean_text(&submission.id),
        ip = clean_text(&submission.ip_address),
    );

    OutgoingEmail {
        from: config.from.clone(),
        to: vec![config.operator.clone()],
        subject: format!("New contact submission: {} ({})", submission.name, submission.service),
        html,
    }
}

/// Mail to the submitter acknowledging receipt.
pub fn submitter_confirmation(config: &EmailConfig, submission: &Submission) -> OutgoingEmail {
    let html = format!(
        "<h2>Thanks for getting in touch, {name}!</h2>\
         <p>Your message about <strong>{service}</strong> has been received. \
         I'll get back to you as soon as possible.</p>\
         <p>For reference, here is what you sent:</p>\
         <blockquote style=\"white-space:pre-wrap\">{message}</blockquote>",
        name = clean_text(&submission.name),
        service = clean_text(&submission.service),
        message = clean_text(&submission.message),
    );

    OutgoingEmail {
        from: config.from.clone(),
        to: vec![submission.email.clone()],
        subject: "Thanks for your message".to_string(),
        html,
    }
}
