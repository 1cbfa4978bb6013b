//! Diesel table definitions for the ledger schema.
//!
//! These must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Everyone who can sign in. Admins have no manager; their
    /// `root_admin_id` is empty and they root their own tenant.
    users (id) {
        id -> Uuid,
        name -> Text,
        /// Lower-cased, unique across all tenants.
        email -> Text,
        /// `ADMIN`, `ENGINEER` or `TECHNICIAN`.
        role -> Text,
        manager_id -> Nullable<Uuid>,
        root_admin_id -> Nullable<Uuid>,
        job_title -> Nullable<Text>,
        phone -> Nullable<Text>,
        avatar_url -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Construction sites owned by one admin.
    projects (id) {
        id -> Uuid,
        name -> Text,
        location -> Text,
        manager_id -> Uuid,
        /// `ACTIVE` or `ARCHIVED`.
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Cash handed to a holder against a project.
    advances (id) {
        id -> Uuid,
        project_id -> Uuid,
        /// Holder. Not a foreign key: settled advances outlive their holder.
        user_id -> Uuid,
        created_by -> Uuid,
        amount -> Numeric,
        /// May go negative when overdrafts are allowed.
        remaining_amount -> Numeric,
        /// `PENDING`, `OPEN`, `CLOSED` or `REJECTED`.
        status -> Text,
        description -> Text,
        date -> Date,
        /// Present only on `CLOSED` rows.
        settlement_data -> Nullable<Jsonb>,
        /// Present only on `REJECTED` rows.
        rejection_reason -> Nullable<Text>,
        /// The settled advance whose deficit opened this one.
        origin_advance_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Spending recorded against an advance.
    expenses (id) {
        id -> Uuid,
        advance_id -> Uuid,
        user_id -> Uuid,
        /// Derived total; recomputed on load.
        amount -> Numeric,
        /// Set for fixed expenses, empty for invoices.
        base_amount -> Nullable<Numeric>,
        additional_amount -> Numeric,
        description -> Text,
        notes -> Nullable<Text>,
        image_url -> Nullable<Text>,
        date -> Date,
        /// `PENDING`, `APPROVED` or `REJECTED`.
        status -> Text,
        is_editable -> Bool,
        is_invoice -> Bool,
        /// Invoice lines as a JSON array.
        invoice_items -> Jsonb,
        rejection_reason -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        message -> Text,
        /// `INFO`, `SUCCESS`, `WARNING` or `ERROR`.
        kind -> Text,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(projects -> users (manager_id));
diesel::joinable!(advances -> projects (project_id));
diesel::joinable!(expenses -> advances (advance_id));
diesel::joinable!(notifications -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, projects, advances, expenses, notifications);
