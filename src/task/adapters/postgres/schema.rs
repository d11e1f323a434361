//! Diesel schema for task and claim persistence.

diesel::table! {
    /// Relief tasks.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Creating user.
        creator_id -> Uuid,
        /// Short title.
        #[max_length = 200]
        title -> Varchar,
        /// Full description.
        description -> Text,
        /// Work category.
        #[max_length = 50]
        task_type -> Varchar,
        /// Street address.
        address -> Text,
        /// Free-form directions.
        location_details -> Nullable<Text>,
        /// Capacity.
        required_volunteers -> Int4,
        /// Skill list as a JSON array of strings.
        required_skills -> Jsonb,
        /// Optional deadline.
        deadline -> Nullable<Timestamptz>,
        /// Listing priority, 1 to 5.
        priority_level -> Int2,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Review state.
        #[max_length = 50]
        approval_status -> Varchar,
        /// Reviewer.
        approved_by -> Nullable<Uuid>,
        /// Review time.
        approved_at -> Nullable<Timestamptz>,
        /// Reviewer's remarks.
        approval_notes -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Volunteer claims on task slots.
    task_claims (id) {
        /// Claim identifier.
        id -> Uuid,
        /// Parent task.
        task_id -> Uuid,
        /// Claiming user.
        user_id -> Uuid,
        /// Claim status.
        #[max_length = 50]
        status -> Varchar,
        /// Volunteer notes.
        notes -> Nullable<Text>,
        /// Reservation time.
        claimed_at -> Timestamptz,
        /// Start time.
        started_at -> Nullable<Timestamptz>,
        /// Completion time.
        completed_at -> Nullable<Timestamptz>,
        /// Release time.
        cancelled_at -> Nullable<Timestamptz>,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(task_claims -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, task_claims);
