//! Program lookup: one row per enrolled course, joining the platform's catalog
//! fields with the stored program metadata.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use super::hijri::HijriDate;
use super::metadata::{one_of, ValidationErrors, TRAINER_TYPE};
use super::PROGRAM_METADATA_KEY;
use crate::courses::{CourseSettings, CourseStore, EnrollmentStore, StoreError};

pub const TRAINING_LOCATION: &str = "FutureX";
pub const DURATION_UNIT: &str = "hour";

/// Display name of a `Type_of_Activity` code as the programs registry spells it
pub fn activity_name(code: i64) -> Option<&'static str> {
    let name = match code {
        55 => "ورش العمل - ورش العمل",
        65 => "التعلم التشاركي - الدروس التطبيقية",
        75 => "التعلم التشاركي - دورة بحث الدرس",
        135 => "التدريب - التدريب المباشر",
        155 => "التدريب - التدريب الإلكتروني",
        165 => "برنامج الاستثمار الأمثل (برامج قصيرة)",
        175 => "برنامج الاستثمار الأمثل (برامج طويلة)",
        190 => "الملتقيات - المؤتمرات",
        195 => "الملتقيات - اللقاءات التربوية",
        200 => "الملتقيات - المحاضرات",
        205 => "الملتقيات - الندوات",
        270 => "التعلم التشاركي - الزيارات الميدانية",
        _ => return None,
    };
    Some(name)
}

/// Digits only, 10 to 15 of them
pub fn is_valid_national_id(national_id: &str) -> bool {
    (10..=15).contains(&national_id.len()) && national_id.bytes().all(|b| b.is_ascii_digit())
}

/// Whole hours from an effort string such as `"5"` or `"2:31"`.
///
/// Minutes outside `0..60` count as zero. Halves round to even.
pub fn effort_hours(effort: &str) -> Option<i64> {
    let mut parts = effort.trim().split(':');
    let hours: i64 = parts.next()?.trim().parse().ok()?;
    let minutes: i64 = match parts.next() {
        Some(m) => m.trim().parse().ok()?,
        None => 0,
    };
    let minutes = if (0..60).contains(&minutes) { minutes } else { 0 };

    Some((hours as f64 + minutes as f64 / 60.0).round_ties_even() as i64)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramLookup {
    #[serde(rename = "Program_name")]
    pub program_name: String,
    #[serde(rename = "Program_code")]
    pub program_code: String,
    #[serde(rename = "Type_of_Activity")]
    pub type_of_activity: String,
    #[serde(rename = "Type_of_Activity_id")]
    pub type_of_activity_id: i64,
    #[serde(rename = "Mandatory")]
    pub mandatory: String,
    #[serde(rename = "Program_ABROVE")]
    pub program_abrove: String,
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Date_Start")]
    pub date_start: NaiveDate,
    #[serde(rename = "Date_End")]
    pub date_end: Option<NaiveDate>,
    #[serde(rename = "Date_Start_Hijri")]
    pub date_start_hijri: String,
    #[serde(rename = "Date_End_Hijri")]
    pub date_end_hijri: Option<String>,
    pub duration: i64,
    #[serde(rename = "Training_location")]
    pub training_location: &'static str,
    #[serde(rename = "Trainer_type")]
    pub trainer_type: i64,
    #[serde(rename = "Unit")]
    pub unit: &'static str,
}

/// A lookup row, or the reasons a course could not produce one
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LookupEntry {
    Program(ProgramLookup),
    Invalid {
        error: &'static str,
        details: HashMap<String, String>,
        course_id: String,
    },
}

impl ProgramLookup {
    /// Build and validate the row for one course.
    ///
    /// Every field is required; only the end dates may be null.
    pub fn from_course(course: &CourseSettings) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let metadata = course
            .other_course_settings
            .get(PROGRAM_METADATA_KEY)
            .and_then(Value::as_object);
        let stored = |name: &str| metadata.and_then(|m| m.get(name));

        let program_name = required_text("Program_name", course.display_name.clone(), &mut errors);
        let program_code = required_text("Program_code", stored_text(stored("Program_code")), &mut errors);
        let type_of_activity_id = stored("Type_of_Activity").and_then(Value::as_i64);
        let type_of_activity = required_text(
            "Type_of_Activity",
            type_of_activity_id.and_then(activity_name).map(str::to_string),
            &mut errors,
        );
        let type_of_activity_id = required("Type_of_Activity_id", type_of_activity_id, &mut errors);
        let mandatory = required_text("Mandatory", stored_text(stored("Mandatory")), &mut errors)
            .and_then(|v| one_of(v, "Mandatory", &mut errors));
        let program_abrove = required_text("Program_ABROVE", stored_text(stored("Program_ABROVE")), &mut errors)
            .and_then(|v| one_of(v, "Program_ABROVE", &mut errors));

        let date_start = course.start.map(|d| d.date_naive());
        let date_end = course.end.map(|d| d.date_naive());
        let date_start = required("Date_Start", date_start, &mut errors);

        let duration = match course.effort.as_deref().filter(|e| !e.trim().is_empty()) {
            None => 0,
            Some(effort) => effort_hours(effort).unwrap_or_else(|| {
                warn!("Unreadable effort {:?} for {}", effort, course.course_key);
                0
            }),
        };

        match (
            program_name,
            program_code,
            type_of_activity,
            type_of_activity_id,
            mandatory,
            program_abrove,
            date_start,
        ) {
            (
                Some(program_name),
                Some(program_code),
                Some(type_of_activity),
                Some(type_of_activity_id),
                Some(mandatory),
                Some(program_abrove),
                Some(date_start),
            ) if errors.is_empty() => Ok(Self {
                program_name,
                program_code,
                type_of_activity,
                type_of_activity_id,
                mandatory,
                program_abrove,
                code: course.course_key.to_string(),
                date_start,
                date_end,
                date_start_hijri: HijriDate::from(date_start).to_string(),
                date_end_hijri: date_end.map(|d| HijriDate::from(d).to_string()),
                duration,
                training_location: TRAINING_LOCATION,
                trainer_type: TRAINER_TYPE,
                unit: DURATION_UNIT,
            }),
            _ => Err(errors),
        }
    }
}

impl LookupEntry {
    pub fn for_course(course: &CourseSettings) -> Self {
        match ProgramLookup::from_course(course) {
            Ok(program) => LookupEntry::Program(program),
            Err(errors) => LookupEntry::Invalid {
                error: "Invalid program lookup data",
                details: errors.into_field_errors(),
                course_id: course.course_key.to_string(),
            },
        }
    }
}

/// Lookup rows for every course the user is enrolled in.
///
/// Enrollments in courses the store does not know are skipped.
pub async fn list_program_lookups(
    courses: &dyn CourseStore,
    enrollments: &dyn EnrollmentStore,
    user_id: u64,
) -> Result<Vec<LookupEntry>, StoreError> {
    let mut entries = Vec::new();
    for course_key in enrollments.enrolled_courses(user_id).await? {
        match courses.get_course(&course_key).await? {
            Some(course) => entries.push(LookupEntry::for_course(&course)),
            None => warn!("User {} is enrolled in unknown course {}", user_id, course_key),
        }
    }
    Ok(entries)
}

fn stored_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required<T>(name: &str, value: Option<T>, errors: &mut ValidationErrors) -> Option<T> {
    if value.is_none() {
        errors.add(name, "This field may not be null.");
    }
    value
}

fn required_text(name: &str, value: Option<String>, errors: &mut ValidationErrors) -> Option<String> {
    let text = required(name, value, errors)?.trim().to_string();
    if text.is_empty() {
        errors.add(name, "This field may not be blank.");
        return None;
    }
    Some(text)
}
