//! PostgreSQL-backed `IdentityRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::Page;

use crate::domain::ports::{
    IdentityQuery, IdentityRepository, IdentitySortField, RepositoryError,
};
use crate::domain::{
    EmailAddress, FacultyId, Identity, IdentityId, PasswordHash, PasswordReset, ProfileRef, Role,
    StudentId, Username,
};

use super::diesel_helpers::{
    count_from_db, count_to_db, map_diesel_error, map_pool_error, order_by_direction,
    search_pattern, total_from_db, window,
};
use super::models::{IdentityRecord, IdentityRow};
use super::pool::DbPool;
use super::schema::identities;

/// Diesel-backed implementation of the `IdentityRepository` port.
#[derive(Clone)]
pub struct DieselIdentityRepository {
    pool: DbPool,
}

impl DieselIdentityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn profile_from_columns(
    student: Option<uuid::Uuid>,
    faculty: Option<uuid::Uuid>,
) -> Result<Option<ProfileRef>, RepositoryError> {
    match (student, faculty) {
        (None, None) => Ok(None),
        (Some(id), None) => Ok(Some(ProfileRef::Student(StudentId::from_uuid(id)))),
        (None, Some(id)) => Ok(Some(ProfileRef::Faculty(FacultyId::from_uuid(id)))),
        (Some(_), Some(_)) => Err(RepositoryError::query(
            "identity links both a student and a faculty profile",
        )),
    }
}

fn row_to_identity(row: IdentityRow) -> Result<Identity, RepositoryError> {
    let username = Username::parse(&row.username)
        .map_err(|err| RepositoryError::query(format!("stored username: {err}")))?;
    let email = EmailAddress::parse(&row.email)
        .map_err(|err| RepositoryError::query(format!("stored email: {err}")))?;
    let role: Role = row
        .role
        .parse()
        .map_err(|err| RepositoryError::query(format!("stored role: {err}")))?;
    let password_reset = match (row.reset_token_hash, row.reset_expires_at) {
        (Some(token_hash), Some(expires_at)) => Some(PasswordReset {
            token_hash,
            expires_at,
        }),
        _ => None,
    };
    Ok(Identity {
        id: IdentityId::from_uuid(row.id),
        username,
        email,
        password_hash: PasswordHash::new(row.password_hash),
        role,
        profile: profile_from_columns(row.student_id, row.faculty_id)?,
        active: row.active,
        verified: row.verified,
        failed_login_attempts: count_from_db(row.failed_login_attempts, "failed_login_attempts")?,
        lock_until: row.lock_until,
        password_reset,
        last_login_at: row.last_login_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn identity_to_record(identity: &Identity) -> Result<IdentityRecord<'_>, RepositoryError> {
    let reset = identity.password_reset.as_ref();
    Ok(IdentityRecord {
        id: *identity.id.as_uuid(),
        username: identity.username.as_str(),
        email: identity.email.as_str(),
        password_hash: identity.password_hash.as_str(),
        role: identity.role.as_str(),
        student_id: identity
            .profile
            .and_then(ProfileRef::student)
            .map(Into::into),
        faculty_id: identity
            .profile
            .and_then(ProfileRef::faculty)
            .map(Into::into),
        active: identity.active,
        verified: identity.verified,
        failed_login_attempts: count_to_db(
            identity.failed_login_attempts,
            "failed_login_attempts",
        )?,
        lock_until: identity.lock_until,
        reset_token_hash: reset.map(|r| r.token_hash.as_str()),
        reset_expires_at: reset.map(|r| r.expires_at),
        last_login_at: identity.last_login_at,
        created_at: identity.created_at,
        updated_at: identity.updated_at,
    })
}

fn filtered(query: &IdentityQuery) -> identities::BoxedQuery<'static, diesel::pg::Pg> {
    let mut boxed = identities::table.into_boxed();
    if let Some(role) = query.role {
        boxed = boxed.filter(identities::role.eq(role.as_str()));
    }
    if let Some(active) = query.active {
        boxed = boxed.filter(identities::active.eq(active));
    }
    if let Some(pattern) = search_pattern(query.search.as_deref()) {
        boxed = boxed.filter(
            identities::username
                .ilike(pattern.clone())
                .or(identities::email.ilike(pattern)),
        );
    }
    boxed
}

impl DieselIdentityRepository {
    async fn find_one(
        &self,
        boxed: identities::BoxedQuery<'static, diesel::pg::Pg>,
    ) -> Result<Option<Identity>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<IdentityRow> = boxed
            .select(IdentityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_identity).transpose()
    }
}

#[async_trait]
impl IdentityRepository for DieselIdentityRepository {
    async fn insert(&self, identity: &Identity) -> Result<(), RepositoryError> {
        let record = identity_to_record(identity)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(identities::table)
            .values(&record)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn update(&self, identity: &Identity) -> Result<(), RepositoryError> {
        let record = identity_to_record(identity)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(identities::table.find(record.id))
            .set(&record)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(RepositoryError::query(format!(
                "identity {} does not exist",
                identity.id
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, RepositoryError> {
        self.find_one(
            identities::table
                .filter(identities::id.eq(*id.as_uuid()))
                .into_boxed(),
        )
        .await
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, RepositoryError> {
        let wanted = username.trim().to_lowercase();
        self.find_one(
            identities::table
                .filter(identities::username.eq(wanted))
                .into_boxed(),
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, RepositoryError> {
        let wanted = email.trim().to_lowercase();
        self.find_one(
            identities::table
                .filter(identities::email.eq(wanted))
                .into_boxed(),
        )
        .await
    }

    async fn find_by_reset_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Identity>, RepositoryError> {
        self.find_one(
            identities::table
                .filter(identities::reset_token_hash.eq(token_hash.to_owned()))
                .into_boxed(),
        )
        .await
    }

    async fn list(&self, query: &IdentityQuery) -> Result<Page<Identity>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(query)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let boxed = filtered(query);
        let direction = query.sort.direction;
        let ordered = match query.sort.field {
            IdentitySortField::Username => {
                order_by_direction!(boxed, direction, identities::username)
            }
            IdentitySortField::Email => order_by_direction!(boxed, direction, identities::email),
            IdentitySortField::CreatedAt => {
                order_by_direction!(boxed, direction, identities::created_at)
            }
        };
        let (skip, limit) = window(query.page);
        let rows: Vec<IdentityRow> = ordered
            .then_order_by(identities::id.asc())
            .offset(skip)
            .limit(limit)
            .select(IdentityRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = rows
            .into_iter()
            .map(row_to_identity)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total_from_db(total), query.page))
    }

    async fn delete(&self, id: &IdentityId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(identities::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    //! Row mapping coverage; query behaviour is exercised against the
    //! in-memory adapter.
    use super::*;
    use crate::domain::NewIdentity;
    use crate::test_support::fixture_timestamp;
    use rstest::rstest;

    fn identity(profile: Option<ProfileRef>, role: Role) -> Identity {
        Identity::new(
            NewIdentity {
                username: Username::parse("ada").expect("username"),
                email: EmailAddress::parse("ada@example.edu").expect("email"),
                role,
                profile,
            },
            PasswordHash::new("$argon2id$stub"),
            fixture_timestamp(),
        )
        .expect("identity")
    }

    fn round_trip(identity: &Identity) -> Identity {
        let record = identity_to_record(identity).expect("record");
        let row = IdentityRow {
            id: record.id,
            username: record.username.to_owned(),
            email: record.email.to_owned(),
            password_hash: record.password_hash.to_owned(),
            role: record.role.to_owned(),
            student_id: record.student_id,
            faculty_id: record.faculty_id,
            active: record.active,
            verified: record.verified,
            failed_login_attempts: record.failed_login_attempts,
            lock_until: record.lock_until,
            reset_token_hash: record.reset_token_hash.map(str::to_owned),
            reset_expires_at: record.reset_expires_at,
            last_login_at: record.last_login_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        row_to_identity(row).expect("identity")
    }

    #[rstest]
    #[case(None, Role::Admin)]
    #[case(Some(ProfileRef::Student(StudentId::generate())), Role::Student)]
    #[case(Some(ProfileRef::Faculty(FacultyId::generate())), Role::Faculty)]
    fn profile_link_survives_storage(#[case] profile: Option<ProfileRef>, #[case] role: Role) {
        let original = identity(profile, role);
        assert_eq!(round_trip(&original), original);
    }

    #[rstest]
    fn reset_and_lock_state_survive_storage() {
        let mut original = identity(None, Role::Admin);
        original.failed_login_attempts = 5;
        original.lock_until = Some(fixture_timestamp());
        original.begin_password_reset("ab".repeat(32), fixture_timestamp());
        assert_eq!(round_trip(&original), original);
    }

    #[rstest]
    fn conflicting_profile_columns_are_rejected() {
        let result = profile_from_columns(Some(uuid::Uuid::nil()), Some(uuid::Uuid::nil()));
        assert!(result.is_err());
    }
}
