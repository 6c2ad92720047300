//! Static informational pages.
//!
//! Each page is served as JSON metadata for the presentation layer; no HTML
//! is rendered here.

use axum::{Json, Router, routing::get};
use serde::Serialize;

/// Metadata consumed by the front end when rendering a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
  pub title:       &'static str,
  pub description: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub viewport:    Option<&'static str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub theme_color: Option<&'static str>,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub mobile_app:  bool,
}

impl PageMeta {
  const fn basic(title: &'static str, description: &'static str) -> Self {
    Self { title, description, viewport: None, theme_color: None, mobile_app: false }
  }
}

/// A routable page.
#[derive(Debug, Serialize)]
pub struct Page {
  #[serde(skip)]
  pub path: &'static str,
  #[serde(rename = "page")]
  pub name: &'static str,
  pub meta: PageMeta,
}

pub static PAGES: [Page; 6] = [
  Page {
    path: "/",
    name: "home",
    meta: PageMeta {
      title:       "Atrium - Home",
      description: "Welcome to the Atrium project template",
      viewport:    Some("width=device-width, initial-scale=1, maximum-scale=5"),
      // Bootstrap primary.
      theme_color: Some("#0d6efd"),
      mobile_app:  false,
    },
  },
  Page {
    path: "/about/",
    name: "about",
    meta: PageMeta::basic("About", "Learn about our project"),
  },
  Page {
    path: "/contact/",
    name: "contact",
    meta: PageMeta::basic("Contact Us", "Get in touch with our team"),
  },
  Page {
    path: "/terms/",
    name: "terms",
    meta: PageMeta::basic("Terms of Service", "Our terms and conditions"),
  },
  Page {
    path: "/privacy/",
    name: "privacy",
    meta: PageMeta::basic("Privacy Policy", "How we protect your data"),
  },
  Page {
    path: "/faq/",
    name: "faq",
    meta: PageMeta {
      mobile_app: true,
      ..PageMeta::basic("Frequently Asked Questions", "Get answers about Notes App")
    },
  },
];

/// A stateless router serving every entry of [`PAGES`] on `GET`.
pub fn router() -> Router {
  PAGES.iter().fold(Router::new(), |router, page| {
    router.route(page.path, get(move || async move { Json(page) }))
  })
}
