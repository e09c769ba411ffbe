//! Database queries for grades: entry, scoped listings and analytics.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Query, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseBackend, EntityTrait, FromQueryResult,
    ModelTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use crate::entity::exam;
use crate::entity::grade::{self, ActiveModel, Entity as Grade};
use crate::error::{AppError, AppResult};
use crate::models::grade::{percentage, round2};
use crate::models::{
    AnalyticsBucket, ExamType, Granularity, LetterGrade, PaginationParams, Term,
};

use super::DbPool;

/// A validated grade ready to be stored. Percentage and letter are derived
/// on insert.
#[derive(Debug, Clone)]
pub struct NewGrade {
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub teacher_id: Option<Uuid>,
    pub exam_id: Option<Uuid>,
    pub term: Term,
    pub exam_type: ExamType,
    pub marks: f64,
    pub max_marks: f64,
    pub remarks: Option<String>,
}

impl NewGrade {
    fn into_active_model(self, id: Uuid, now: chrono::DateTime<Utc>) -> ActiveModel {
        let pct = percentage(self.marks, self.max_marks);
        ActiveModel {
            id: Set(id),
            student_id: Set(self.student_id),
            class_id: Set(self.class_id),
            subject_id: Set(self.subject_id),
            teacher_id: Set(self.teacher_id),
            exam_id: Set(self.exam_id),
            term: Set(self.term.as_str().to_string()),
            exam_type: Set(self.exam_type.as_str().to_string()),
            marks: Set(self.marks),
            max_marks: Set(self.max_marks),
            percentage: Set(pct),
            grade: Set(LetterGrade::from_percentage(pct).as_str().to_string()),
            remarks: Set(self.remarks),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

/// Resolved field changes for an existing grade.
#[derive(Debug, Clone)]
pub struct GradeChanges {
    pub marks: f64,
    pub max_marks: f64,
    pub term: Term,
    pub exam_type: ExamType,
    pub remarks: Option<String>,
}

/// Filters for grade listings. `None` means unrestricted.
#[derive(Debug, Clone, Default)]
pub struct GradeFilter {
    pub subject_id: Option<Uuid>,
    pub class_id: Option<Uuid>,
    pub exam_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub term: Option<Term>,
    pub exam_type: Option<ExamType>,
    /// Allow-list of subjects (teacher scope)
    pub subject_ids: Option<Vec<Uuid>>,
    /// Allow-list of classes (teacher scope)
    pub class_ids: Option<Vec<Uuid>>,
    /// Hide grades attached to unpublished exams
    pub published_only: bool,
}

impl GradeFilter {
    /// True when an allow-list is present but empty, so nothing can match.
    fn matches_nothing(&self) -> bool {
        matches!(&self.subject_ids, Some(ids) if ids.is_empty())
            || matches!(&self.class_ids, Some(ids) if ids.is_empty())
    }

    fn apply(&self, mut select: Select<Grade>) -> Select<Grade> {
        if let Some(id) = self.subject_id {
            select = select.filter(grade::Column::SubjectId.eq(id));
        }
        if let Some(id) = self.class_id {
            select = select.filter(grade::Column::ClassId.eq(id));
        }
        if let Some(id) = self.exam_id {
            select = select.filter(grade::Column::ExamId.eq(id));
        }
        if let Some(id) = self.student_id {
            select = select.filter(grade::Column::StudentId.eq(id));
        }
        if let Some(term) = self.term {
            select = select.filter(grade::Column::Term.eq(term.as_str()));
        }
        if let Some(exam_type) = self.exam_type {
            select = select.filter(grade::Column::ExamType.eq(exam_type.as_str()));
        }
        if let Some(ids) = &self.subject_ids {
            select = select.filter(grade::Column::SubjectId.is_in(ids.iter().copied()));
        }
        if let Some(ids) = &self.class_ids {
            select = select.filter(grade::Column::ClassId.is_in(ids.iter().copied()));
        }
        if self.published_only {
            let published = Query::select()
                .column(exam::Column::Id)
                .from(exam::Entity)
                .and_where(exam::Column::IsPublished.eq(true))
                .to_owned();
            select = select.filter(
                Condition::any()
                    .add(grade::Column::ExamId.is_null())
                    .add(grade::Column::ExamId.in_subquery(published)),
            );
        }
        select
    }
}

/// Sortable grade fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Percentage,
    Marks,
    Term,
    ExamType,
}

impl SortField {
    /// Expression to order by. Terms sort in calendar order, not by name.
    fn order_expr(self) -> SimpleExpr {
        let column = match self {
            SortField::CreatedAt => grade::Column::CreatedAt,
            SortField::UpdatedAt => grade::Column::UpdatedAt,
            SortField::Percentage => grade::Column::Percentage,
            SortField::Marks => grade::Column::Marks,
            SortField::Term => return term_ordinal(),
            SortField::ExamType => grade::Column::ExamType,
        };
        Expr::col((Grade, column)).into()
    }
}

/// `term1` < `term2` < `final`, matching [`Term`]'s declared order.
fn term_ordinal() -> SimpleExpr {
    let term = || Expr::col((Grade, grade::Column::Term));
    Expr::case(term().eq(Term::Term1.as_str()), 0)
        .case(term().eq(Term::Term2.as_str()), 1)
        .finally(2)
        .into()
}

/// Sort order for teacher listings, parsed from `field` or `-field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeSort {
    pub field: SortField,
    pub descending: bool,
}

impl Default for GradeSort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: true,
        }
    }
}

impl GradeSort {
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        let raw = match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw,
            None => return Ok(Self::default()),
        };

        let (descending, name) = match raw.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };

        let field = match name {
            "created_at" | "createdAt" => SortField::CreatedAt,
            "updated_at" | "updatedAt" => SortField::UpdatedAt,
            "percentage" => SortField::Percentage,
            "marks" => SortField::Marks,
            "term" => SortField::Term,
            "exam_type" | "examType" => SortField::ExamType,
            other => return Err(format!("cannot sort by '{}'", other)),
        };

        Ok(Self { field, descending })
    }

    fn apply(self, select: Select<Grade>) -> Select<Grade> {
        let order = if self.descending { Order::Desc } else { Order::Asc };
        select
            .order_by(self.field.order_expr(), order)
            .order_by_asc(grade::Column::Id)
    }
}

/// One grouped analytics row as returned by the store.
#[derive(Debug, Clone, FromQueryResult)]
pub struct AnalyticsRow {
    pub period: Option<String>,
    pub count: i64,
    pub average: Option<f64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

impl From<AnalyticsRow> for AnalyticsBucket {
    fn from(row: AnalyticsRow) -> Self {
        Self {
            period: row.period.unwrap_or_default(),
            count: row.count,
            average_percentage: round2(row.average.unwrap_or(0.0)),
            min_percentage: round2(row.minimum.unwrap_or(0.0)),
            max_percentage: round2(row.maximum.unwrap_or(0.0)),
        }
    }
}

/// Backend-specific expression bucketing `created_at` by day or month.
fn period_expr(backend: DatabaseBackend, granularity: Granularity) -> SimpleExpr {
    let sql = match (backend, granularity) {
        (DatabaseBackend::Postgres, Granularity::Day) => {
            "to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD')"
        }
        (DatabaseBackend::Postgres, Granularity::Month) => {
            "to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM')"
        }
        (DatabaseBackend::MySql, Granularity::Day) => "DATE_FORMAT(created_at, '%Y-%m-%d')",
        (DatabaseBackend::MySql, Granularity::Month) => "DATE_FORMAT(created_at, '%Y-%m')",
        // SQLite stores timestamps as ISO-8601 text
        (_, Granularity::Day) => "substr(created_at, 1, 10)",
        (_, Granularity::Month) => "substr(created_at, 1, 7)",
    };
    Expr::cust(sql)
}

impl DbPool {
    pub async fn insert_grade(&self, new: NewGrade) -> AppResult<grade::Model> {
        new.into_active_model(Uuid::now_v7(), Utc::now())
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert grade: {}", e)))
    }

    /// Insert many grades in one statement. Returned rows keep input order.
    pub async fn insert_grades(&self, rows: Vec<NewGrade>) -> AppResult<Vec<grade::Model>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let ids: Vec<Uuid> = rows.iter().map(|_| Uuid::now_v7()).collect();
        let models = rows
            .into_iter()
            .zip(ids.iter().copied())
            .map(|(row, id)| row.into_active_model(id, now));

        Grade::insert_many(models)
            .exec_without_returning(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert grades: {}", e)))?;

        let mut inserted = Grade::find()
            .filter(grade::Column::Id.is_in(ids.iter().copied()))
            .all(self.connection())
            .await?;
        inserted.sort_by_key(|g| ids.iter().position(|id| *id == g.id));
        Ok(inserted)
    }

    pub async fn get_grade_by_id(&self, id: Uuid) -> AppResult<Option<grade::Model>> {
        Ok(Grade::find_by_id(id).one(self.connection()).await?)
    }

    /// Apply changes and recompute percentage and letter.
    pub async fn update_grade(
        &self,
        existing: grade::Model,
        changes: GradeChanges,
    ) -> AppResult<grade::Model> {
        let pct = percentage(changes.marks, changes.max_marks);
        let mut active: ActiveModel = existing.into();
        active.marks = Set(changes.marks);
        active.max_marks = Set(changes.max_marks);
        active.term = Set(changes.term.as_str().to_string());
        active.exam_type = Set(changes.exam_type.as_str().to_string());
        active.remarks = Set(changes.remarks);
        active.percentage = Set(pct);
        active.grade = Set(LetterGrade::from_percentage(pct).as_str().to_string());
        active.updated_at = Set(Utc::now());

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update grade: {}", e)))
    }

    pub async fn delete_grade(&self, existing: grade::Model) -> AppResult<()> {
        existing.delete(self.connection()).await?;
        Ok(())
    }

    /// Grades in store order (oldest first), the input of result aggregation.
    pub async fn list_grades(&self, filter: &GradeFilter) -> AppResult<Vec<grade::Model>> {
        if filter.matches_nothing() {
            return Ok(Vec::new());
        }

        Ok(filter
            .apply(Grade::find())
            .order_by_asc(grade::Column::CreatedAt)
            .order_by_asc(grade::Column::Id)
            .all(self.connection())
            .await?)
    }

    /// One sorted page of grades plus the total matching the filter.
    pub async fn query_grades_page(
        &self,
        filter: &GradeFilter,
        sort: GradeSort,
        params: &PaginationParams,
    ) -> AppResult<(Vec<grade::Model>, u64)> {
        if filter.matches_nothing() {
            return Ok((Vec::new(), 0));
        }

        let select = filter.apply(Grade::find());
        let total = select.clone().count(self.connection()).await?;

        let rows = sort
            .apply(select)
            .offset(params.offset())
            .limit(u64::from(params.clamped_limit()))
            .all(self.connection())
            .await?;

        Ok((rows, total))
    }

    /// Count, average, minimum and maximum percentage per day or month.
    pub async fn grade_analytics(
        &self,
        filter: &GradeFilter,
        granularity: Granularity,
    ) -> AppResult<Vec<AnalyticsBucket>> {
        if filter.matches_nothing() {
            return Ok(Vec::new());
        }

        let period = period_expr(self.backend(), granularity);

        let rows = filter
            .apply(Grade::find())
            .select_only()
            .column_as(period.clone(), "period")
            .column_as(Expr::cust("COUNT(*)"), "count")
            .column_as(Expr::cust("AVG(percentage)"), "average")
            .column_as(Expr::cust("MIN(percentage)"), "minimum")
            .column_as(Expr::cust("MAX(percentage)"), "maximum")
            .group_by(period.clone())
            .order_by_asc(period)
            .into_model::<AnalyticsRow>()
            .all(self.connection())
            .await?;

        Ok(rows.into_iter().map(AnalyticsBucket::from).collect())
    }
}
