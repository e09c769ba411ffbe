//! Database queries for student profiles.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::student::{self, ActiveModel, Entity as Student};
use crate::entity::user;
use crate::error::{AppError, AppResult};
use crate::models::{CreateStudentRequest, PaginationParams};

use super::DbPool;

/// A student profile joined with its user account.
pub type StudentWithUser = (student::Model, Option<user::Model>);

impl DbPool {
    pub async fn insert_student(&self, req: &CreateStudentRequest) -> AppResult<student::Model> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(req.user_id),
            class_id: Set(req.class_id),
            roll_number: Set(req.roll_number.trim().to_string()),
            parent_name: Set(req.parent_name.clone()),
            parent_phone: Set(req.parent_phone.clone()),
            created_at: Set(Utc::now()),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert student: {}", e)))
    }

    pub async fn get_student_by_id(&self, id: Uuid) -> AppResult<Option<student::Model>> {
        Ok(Student::find_by_id(id).one(self.connection()).await?)
    }

    pub async fn get_student_by_user_id(&self, user_id: Uuid) -> AppResult<Option<student::Model>> {
        Ok(Student::find()
            .filter(student::Column::UserId.eq(user_id))
            .one(self.connection())
            .await?)
    }

    pub async fn get_student_with_user(&self, id: Uuid) -> AppResult<Option<StudentWithUser>> {
        Ok(Student::find_by_id(id)
            .find_also_related(user::Entity)
            .one(self.connection())
            .await?)
    }

    /// Page through students, optionally restricted to a set of classes.
    pub async fn list_students(
        &self,
        class_ids: Option<&[Uuid]>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<StudentWithUser>, u64)> {
        let mut select = Student::find();
        if let Some(ids) = class_ids {
            if ids.is_empty() {
                return Ok((Vec::new(), 0));
            }
            select = select.filter(student::Column::ClassId.is_in(ids.iter().copied()));
        }

        let total = select.clone().count(self.connection()).await?;

        let rows = select
            .order_by_asc(student::Column::RollNumber)
            .order_by_asc(student::Column::Id)
            .offset(params.offset())
            .limit(u64::from(params.clamped_limit()))
            .find_also_related(user::Entity)
            .all(self.connection())
            .await?;

        Ok((rows, total))
    }

    /// Every student of a class, without pagination.
    pub async fn students_in_class(&self, class_id: Uuid) -> AppResult<Vec<student::Model>> {
        Ok(Student::find()
            .filter(student::Column::ClassId.eq(class_id))
            .order_by_asc(student::Column::RollNumber)
            .all(self.connection())
            .await?)
    }

    pub async fn get_students_with_users(&self, ids: &[Uuid]) -> AppResult<Vec<StudentWithUser>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Student::find()
            .filter(student::Column::Id.is_in(ids.iter().copied()))
            .find_also_related(user::Entity)
            .all(self.connection())
            .await?)
    }
}
