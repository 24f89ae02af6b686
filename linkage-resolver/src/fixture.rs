//! Canonical sample catalog.
//!
//! Four products, three categories, five links. "Headphones Delta" has no
//! links, so both strategies report it with a NULL category.

use crate::pairs::ResultPair;
use crate::relation::{Categories, Links, Products};
use linkage_result::Result as LinkageResult;

pub const PRODUCTS: [(i64, &str); 4] = [
    (1, "Laptop Alpha"),
    (2, "Phone Beta"),
    (3, "Tablet Gamma"),
    (4, "Headphones Delta"),
];

pub const CATEGORIES: [(i64, &str); 3] = [(101, "Electronics"), (102, "Computers"), (103, "Gadgets")];

pub const LINKS: [(i64, i64); 5] = [(1, 101), (1, 102), (2, 101), (2, 103), (3, 101)];

/// The three canonical relations.
pub fn canonical_relations() -> LinkageResult<(Products, Categories, Links)> {
    Ok((
        Products::from_rows(&PRODUCTS)?,
        Categories::from_rows(&CATEGORIES)?,
        Links::from_rows(&LINKS)?,
    ))
}

/// Expected output for the canonical relations, in no particular order.
pub fn canonical_pairs() -> Vec<ResultPair> {
    vec![
        ResultPair::matched("Laptop Alpha", "Electronics"),
        ResultPair::matched("Laptop Alpha", "Computers"),
        ResultPair::matched("Phone Beta", "Electronics"),
        ResultPair::matched("Phone Beta", "Gadgets"),
        ResultPair::matched("Tablet Gamma", "Electronics"),
        ResultPair::unmatched("Headphones Delta"),
    ]
}
