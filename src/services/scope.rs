//! Role-based visibility: who may see or write which class, subject and
//! student records.
//!
//! Admins are unrestricted. Teachers are limited to their assigned subjects
//! and classes; a (subject, class) pair is allowed only when the subject is
//! assigned, the subject is owned by that class, and the class is assigned.
//! Students see only themselves, their own class and published exams.

use uuid::Uuid;

use crate::auth::Caller;
use crate::db::{DbPool, ExamVisibility, GradeFilter, TeacherAssignment};
use crate::entity::{student, subject};
use crate::error::{AppError, AppResult};
use crate::models::Role;

/// The caller's resolved visibility.
#[derive(Debug, Clone)]
pub enum Scope {
    Admin,
    Teacher(TeacherAssignment),
    Student {
        profile: student::Model,
        /// Subjects owned by the student's class
        subject_ids: Vec<Uuid>,
    },
}

/// Load the caller's profile and build their scope.
///
/// A teacher or student token whose profile does not exist yields 404.
pub async fn resolve(pool: &DbPool, caller: &Caller) -> AppResult<Scope> {
    match caller.role {
        Role::Admin => Ok(Scope::Admin),
        Role::Teacher => pool
            .get_teacher_assignment_by_user(caller.user_id)
            .await?
            .map(Scope::Teacher)
            .ok_or_else(|| AppError::NotFound("Teacher profile".to_string())),
        Role::Student => {
            let profile = pool
                .get_student_by_user_id(caller.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Student profile".to_string()))?;
            let subject_ids = pool.subject_ids_for_class(profile.class_id).await?;
            Ok(Scope::Student {
                profile,
                subject_ids,
            })
        }
    }
}

/// Teacher check for a (subject, class) pair.
pub fn check_teacher_subject_class(
    assignment: &TeacherAssignment,
    subject: &subject::Model,
    class_id: Uuid,
) -> AppResult<()> {
    if !assignment.subject_ids.contains(&subject.id) {
        return Err(AppError::Forbidden(
            "you are not assigned to this subject".to_string(),
        ));
    }
    if subject.class_id != class_id {
        return Err(AppError::Forbidden(
            "subject does not belong to the requested class".to_string(),
        ));
    }
    check_teacher_class(assignment, class_id)
}

pub fn check_teacher_class(assignment: &TeacherAssignment, class_id: Uuid) -> AppResult<()> {
    if assignment.class_ids.contains(&class_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "you are not assigned to this class".to_string(),
        ))
    }
}

impl Scope {
    pub fn is_admin(&self) -> bool {
        matches!(self, Scope::Admin)
    }

    pub fn teacher_id(&self) -> Option<Uuid> {
        match self {
            Scope::Teacher(a) => Some(a.teacher_id),
            _ => None,
        }
    }

    /// Staff access to one (subject, class) pair. Students are refused.
    pub fn authorize_subject_class(&self, subject: &subject::Model, class_id: Uuid) -> AppResult<()> {
        match self {
            Scope::Admin => {
                if subject.class_id != class_id {
                    return Err(AppError::InvalidInput(
                        "subject does not belong to the requested class".to_string(),
                    ));
                }
                Ok(())
            }
            Scope::Teacher(a) => check_teacher_subject_class(a, subject, class_id),
            Scope::Student { .. } => Err(AppError::Forbidden(
                "students may not access subject/class records".to_string(),
            )),
        }
    }

    /// Read access to a class.
    pub fn authorize_class(&self, class_id: Uuid) -> AppResult<()> {
        match self {
            Scope::Admin => Ok(()),
            Scope::Teacher(a) => check_teacher_class(a, class_id),
            Scope::Student { profile, .. } if profile.class_id == class_id => Ok(()),
            Scope::Student { .. } => Err(AppError::Forbidden(
                "you may only access your own class".to_string(),
            )),
        }
    }

    /// Read access to one student's records.
    pub fn authorize_student(&self, target: &student::Model) -> AppResult<()> {
        match self {
            Scope::Admin => Ok(()),
            Scope::Teacher(a) if a.class_ids.contains(&target.class_id) => Ok(()),
            Scope::Teacher(_) => Err(AppError::Forbidden(
                "student is not in one of your classes".to_string(),
            )),
            Scope::Student { profile, .. } if profile.id == target.id => Ok(()),
            Scope::Student { .. } => Err(AppError::Forbidden(
                "you may only access your own records".to_string(),
            )),
        }
    }

    /// Class allow-list for list endpoints. `None` means every class.
    pub fn class_filter(&self) -> Option<Vec<Uuid>> {
        match self {
            Scope::Admin => None,
            Scope::Teacher(a) => Some(a.class_list()),
            Scope::Student { profile, .. } => Some(vec![profile.class_id]),
        }
    }

    /// Subject allow-list for list endpoints. `None` means every subject.
    pub fn subject_filter(&self) -> Option<Vec<Uuid>> {
        match self {
            Scope::Admin => None,
            Scope::Teacher(a) => Some(a.subject_list()),
            Scope::Student { subject_ids, .. } => Some(subject_ids.clone()),
        }
    }

    /// Base filter for grade listings.
    pub fn grade_filter(&self) -> GradeFilter {
        match self {
            Scope::Admin => GradeFilter::default(),
            Scope::Teacher(a) => GradeFilter {
                subject_ids: Some(a.subject_list()),
                class_ids: Some(a.class_list()),
                ..Default::default()
            },
            Scope::Student { profile, .. } => GradeFilter {
                student_id: Some(profile.id),
                published_only: true,
                ..Default::default()
            },
        }
    }

    /// Visibility rules for exam listings.
    pub fn exam_visibility(&self) -> ExamVisibility {
        match self {
            Scope::Admin => ExamVisibility::default(),
            Scope::Teacher(a) => ExamVisibility {
                subject_ids: Some(a.subject_list()),
                class_ids: Some(a.class_list()),
                published_only: false,
            },
            Scope::Student {
                profile,
                subject_ids,
            } => ExamVisibility {
                subject_ids: Some(subject_ids.clone()),
                class_ids: Some(vec![profile.class_id]),
                published_only: true,
            },
        }
    }
}
