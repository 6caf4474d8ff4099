//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Login identities with credential, lockout, and reset state.
    identities (id) {
        id -> Uuid,
        username -> Varchar,
        email -> Varchar,
        password_hash -> Text,
        role -> Varchar,
        student_id -> Nullable<Uuid>,
        faculty_id -> Nullable<Uuid>,
        active -> Bool,
        verified -> Bool,
        failed_login_attempts -> Int4,
        lock_until -> Nullable<Timestamptz>,
        /// Hex SHA-256 digest of the outstanding reset token.
        reset_token_hash -> Nullable<Varchar>,
        reset_expires_at -> Nullable<Timestamptz>,
        last_login_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Student profiles. Filterable fields are projected into columns; the
    /// full profile lives in `document`.
    students (id) {
        id -> Uuid,
        identity_id -> Uuid,
        roll_number -> Varchar,
        email -> Varchar,
        full_name -> Varchar,
        last_name -> Varchar,
        branch -> Varchar,
        semester -> Int2,
        batch -> Varchar,
        section -> Nullable<Varchar>,
        cgpa -> Float8,
        active -> Bool,
        document -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Faculty profiles; `course_ids` mirrors `course_faculty`.
    faculty (id) {
        id -> Uuid,
        identity_id -> Uuid,
        employee_id -> Varchar,
        email -> Varchar,
        full_name -> Varchar,
        last_name -> Varchar,
        department -> Varchar,
        position -> Varchar,
        join_date -> Date,
        specializations -> Array<Text>,
        course_ids -> Array<Uuid>,
        active -> Bool,
        document -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Course catalogue entries. `revision` guards conditional saves.
    courses (id) {
        id -> Uuid,
        code -> Varchar,
        name -> Varchar,
        department -> Varchar,
        description -> Text,
        credits -> Int2,
        semester -> Int2,
        capacity -> Int4,
        status -> Varchar,
        revision -> Int4,
        document -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Teaching assignments in list order.
    course_faculty (course_id, faculty_id) {
        course_id -> Uuid,
        faculty_id -> Uuid,
        position -> Int4,
    }
}

diesel::table! {
    /// Roster entries in enrollment order.
    course_enrollments (course_id, student_id) {
        course_id -> Uuid,
        student_id -> Uuid,
        position -> Int4,
        enrolled_at -> Timestamptz,
        grade -> Varchar,
        attendance_present -> Int4,
        attendance_total -> Int4,
    }
}

diesel::joinable!(course_faculty -> courses (course_id));
diesel::joinable!(course_enrollments -> courses (course_id));

diesel::allow_tables_to_appear_in_same_query!(
    identities,
    students,
    faculty,
    courses,
    course_faculty,
    course_enrollments,
);
