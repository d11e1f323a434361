//! Diesel schema for the user directory.

diesel::table! {
    /// Users known to the identity provider.
    users (id) {
        /// User identifier.
        id -> Uuid,
        /// Role in canonical string form.
        #[max_length = 50]
        role -> Varchar,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}
