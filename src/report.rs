use std::cmp::Reverse;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::Subject;
use crate::policy::{Assessment, Recommendation, Status};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMix {
    pub safe: usize,
    pub danger: usize,
    pub info: usize,
}

fn classes(count: u64) -> &'static str {
    if count == 1 {
        "class"
    } else {
        "classes"
    }
}

pub fn recommendation_message(assessment: &Assessment) -> String {
    match assessment.recommendation {
        Recommendation::NoClasses => "No classes recorded yet.".to_string(),
        Recommendation::Bunk(count) => format!("You can bunk {count} {}.", classes(count)),
        Recommendation::Attend(count) => format!("You must attend {count} {}.", classes(count)),
        Recommendation::NoLimit => "No minimum set. Bunk freely.".to_string(),
        Recommendation::StayPerfect => "On track. Don't miss!".to_string(),
        Recommendation::Unrecoverable => "Cannot reach 100%".to_string(),
    }
}

/// Plain-text card for one subject; `position` is the 1-based index users type.
pub fn render_card(position: usize, subject: &Subject) -> String {
    let assessment = subject.assess();
    let mut output = String::new();

    let _ = writeln!(
        output,
        "#{position} {} [{}]",
        subject.name,
        assessment.status.as_str()
    );
    let _ = writeln!(output, "  {}", recommendation_message(&assessment));
    let _ = writeln!(
        output,
        "  Current: {:.1}% (Goal: {})",
        assessment.current_percent, subject.min_percentage
    );
    let _ = write!(
        output,
        "  Attended: {}  Missed: {}",
        subject.attended, subject.missed
    );

    output
}

pub fn render_list(subjects: &[Subject]) -> String {
    if subjects.is_empty() {
        return "No subjects added yet. Add one with `add --name <NAME>`.".to_string();
    }

    subjects
        .iter()
        .enumerate()
        .map(|(index, subject)| render_card(index + 1, subject))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn summarize_by_status(subjects: &[Subject]) -> StatusMix {
    let mut mix = StatusMix::default();
    for subject in subjects {
        match subject.assess().status {
            Status::Safe => mix.safe += 1,
            Status::Danger => mix.danger += 1,
            Status::Info => mix.info += 1,
        }
    }
    mix
}

/// Danger subjects, unrecoverable first, then by classes still to attend.
fn needs_attention(subjects: &[Subject]) -> Vec<(usize, &Subject, Assessment)> {
    let mut flagged: Vec<_> = subjects
        .iter()
        .enumerate()
        .map(|(index, subject)| (index + 1, subject, subject.assess()))
        .filter(|(_, _, assessment)| assessment.status == Status::Danger)
        .collect();

    flagged.sort_by_key(|(_, _, assessment)| match assessment.recommendation {
        Recommendation::Unrecoverable => (0, Reverse(0)),
        _ => (1, Reverse(assessment.action_count().unwrap_or(0))),
    });
    flagged
}

pub fn build_report(subjects: &[Subject], generated_at: DateTime<Utc>) -> String {
    let mix = summarize_by_status(subjects);
    let mut output = String::new();

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(
        output,
        "Generated {} for {} subjects",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        subjects.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");
    let _ = writeln!(output, "- safe: {}", mix.safe);
    let _ = writeln!(output, "- danger: {}", mix.danger);
    let _ = writeln!(output, "- info: {}", mix.info);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Subjects");

    if subjects.is_empty() {
        let _ = writeln!(output, "No subjects tracked yet.");
    } else {
        for (index, subject) in subjects.iter().enumerate() {
            let assessment = subject.assess();
            let _ = writeln!(
                output,
                "- #{} {} ({}): {:.1}% of {} goal, {} attended / {} missed. {}",
                index + 1,
                subject.name,
                assessment.status.as_str(),
                assessment.current_percent,
                subject.min_percentage,
                subject.attended,
                subject.missed,
                recommendation_message(&assessment)
            );
        }
    }

    let flagged = needs_attention(subjects);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Needs Attention");

    if flagged.is_empty() {
        let _ = writeln!(output, "Every subject is on track.");
    } else {
        for (position, subject, assessment) in flagged {
            let _ = writeln!(
                output,
                "- #{} {}: {}",
                position,
                subject.name,
                recommendation_message(&assessment)
            );
        }
    }

    output
}
