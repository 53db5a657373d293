//! Enrollments Repository

use sqlx::{Postgres, Transaction, query};

use crate::{
    domain::{catalog::records::CourseUuid, enrollments::EnrollmentUuid, orders::OrderUuid},
    identity::UserUuid,
};

const GRANT_ENROLLMENT_SQL: &str = include_str!("sql/grant_enrollment.sql");
const REVOKE_ORDER_ENROLLMENTS_SQL: &str = include_str!("sql/revoke_order_enrollments.sql");
#[cfg(test)]
const IS_ENROLLED_SQL: &str = include_str!("sql/is_enrolled.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgEnrollmentsRepository;

impl PgEnrollmentsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert-or-ignore on `(user, course)`. Returns whether a row was added.
    pub(crate) async fn grant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        course: CourseUuid,
        order: OrderUuid,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(GRANT_ENROLLMENT_SQL)
            .bind(EnrollmentUuid::new().into_uuid())
            .bind(user.into_uuid())
            .bind(course.into_uuid())
            .bind(order.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Delete every enrollment the order granted.
    pub(crate) async fn revoke_for_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(REVOKE_ORDER_ENROLLMENTS_SQL)
            .bind(order.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    #[cfg(test)]
    pub(crate) async fn is_enrolled(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        course: CourseUuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<Postgres, bool>(IS_ENROLLED_SQL)
            .bind(user.into_uuid())
            .bind(course.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::{TestContext, helpers};

    use super::*;

    #[tokio::test]
    async fn grant_is_idempotent_per_user_and_course() -> TestResult {
        let ctx = TestContext::new().await;
        let course = helpers::create_course(&ctx, "Rust 101", 50_00).await?;
        let user = UserUuid::new();
        let first = helpers::create_order(&ctx, Some(user), 50_00).await?;
        let second = helpers::create_order(&ctx, Some(user), 50_00).await?;
        let repository = PgEnrollmentsRepository::new();

        let mut tx = ctx.db.begin_test_transaction().await;
        let granted = repository.grant(&mut tx, user, course, first).await?;
        let regranted = repository.grant(&mut tx, user, course, first).await?;
        let from_other_order = repository.grant(&mut tx, user, course, second).await?;
        tx.commit().await?;

        assert!(granted, "first grant inserts");
        assert!(!regranted, "redelivery must not insert");
        assert!(!from_other_order, "one enrollment per user and course");
        assert_eq!(helpers::count_enrollments(&ctx, first).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn revoke_removes_only_the_orders_enrollments() -> TestResult {
        let ctx = TestContext::new().await;
        let course = helpers::create_course(&ctx, "Rust 101", 50_00).await?;
        let refunded_buyer = UserUuid::new();
        let other_buyer = UserUuid::new();
        let refunded = helpers::create_order(&ctx, Some(refunded_buyer), 50_00).await?;
        let kept = helpers::create_order(&ctx, Some(other_buyer), 50_00).await?;
        let repository = PgEnrollmentsRepository::new();

        let mut tx = ctx.db.begin_test_transaction().await;
        repository.grant(&mut tx, refunded_buyer, course, refunded).await?;
        repository.grant(&mut tx, other_buyer, course, kept).await?;
        let revoked = repository.revoke_for_order(&mut tx, refunded).await?;
        tx.commit().await?;

        assert_eq!(revoked, 1);
        assert!(!helpers::is_enrolled(&ctx, refunded_buyer, course).await?);
        assert!(helpers::is_enrolled(&ctx, other_buyer, course).await?);

        Ok(())
    }
}
