//! Diesel table definitions for the review store.
#![allow(missing_docs)]

diesel::table! {
    banks (bank_id) {
        bank_id -> Integer,
        bank_name -> Text,
        source -> Nullable<Text>,
    }
}

diesel::table! {
    reviews (review_id) {
        review_id -> Text,
        bank_id -> Integer,
        review_text -> Text,
        rating -> Integer,
        sentiment_label -> Nullable<Text>,
        sentiment_score -> Nullable<Double>,
        theme -> Nullable<Text>,
        date -> Nullable<Text>,
    }
}

diesel::joinable!(reviews -> banks (bank_id));

diesel::allow_tables_to_appear_in_same_query!(banks, reviews,);
