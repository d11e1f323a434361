//! Diesel schema for need persistence.

diesel::table! {
    /// Reported needs.
    needs (id) {
        /// Need identifier.
        id -> Uuid,
        /// Reporting user.
        reporter_id -> Uuid,
        /// Short title.
        #[max_length = 200]
        title -> Varchar,
        /// Full description.
        description -> Text,
        /// Need category.
        #[max_length = 50]
        need_type -> Varchar,
        /// Street address.
        address -> Text,
        /// Urgency, 1 to 5.
        urgency_level -> Int2,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Current assignee.
        assigned_to -> Nullable<Uuid>,
        /// When the current assignee took over.
        assigned_at -> Nullable<Timestamptz>,
        /// When the need was resolved.
        resolved_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only assignment audit trail.
    need_assignments (id) {
        /// Record identifier.
        id -> Uuid,
        /// Need the record belongs to.
        need_id -> Uuid,
        /// Linked task.
        task_id -> Nullable<Uuid>,
        /// Responsible user.
        user_id -> Uuid,
        /// User whose action produced the record.
        recorded_by -> Uuid,
        /// Captured status.
        #[max_length = 20]
        status -> Varchar,
        /// Free-form notes.
        notes -> Nullable<Text>,
        /// When the record was appended.
        recorded_at -> Timestamptz,
    }
}

diesel::joinable!(need_assignments -> needs (need_id));
diesel::allow_tables_to_appear_in_same_query!(needs, need_assignments);
