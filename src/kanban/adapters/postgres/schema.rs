//! Diesel table definitions for the ordering engine.

diesel::table! {
    boards (id) {
        id -> Uuid,
        name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    columns (id) {
        id -> Uuid,
        board_id -> Uuid,
        title -> Text,
        status -> Nullable<Text>,
        color -> Nullable<Text>,
        position -> Int8,
        is_collapsed -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    tasks (id) {
        id -> Uuid,
        column_id -> Uuid,
        board_id -> Uuid,
        title -> Text,
        status -> Text,
        priority -> Text,
        position -> Int8,
        assignees -> Array<Text>,
        tags -> Array<Text>,
        due_date -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(columns -> boards (board_id));
diesel::joinable!(tasks -> boards (board_id));
diesel::joinable!(tasks -> columns (column_id));

diesel::allow_tables_to_appear_in_same_query!(boards, columns, tasks);
