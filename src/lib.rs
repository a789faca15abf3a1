//! Client for furrymap: logs in, scrapes user listings, markers and profiles
//! out of the site's HTML, and mirrors the public marker feed to a JSON file.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod geo;
pub mod http;
pub mod models;
pub mod parser;
pub mod session;

pub use client::Client;
pub use config::{ClientConfig, Credentials};
pub use error::{Error, Result};
pub use geo::{CountryLookup, NoCountryLookup};
pub use models::{
    About, Contact, FullProfile, Location, Marker, MarkerFeedEntry, MarkerId, Phones,
    ProfileSummary, SearchFilter, SearchResult,
};
