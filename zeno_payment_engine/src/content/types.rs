use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ContentItem;
use crate::helpers::slugify;

/// Declares a content type whose draft is the item minus its id.
macro_rules! content_item {
    ($(#[$meta:meta])* $name:ident / $draft:ident, $kind:literal { $($(#[$fmeta:meta])* $field:ident: $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub id: u64,
            $($(#[$fmeta])* pub $field: $ty),*
        }

        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $draft {
            $($(#[$fmeta])* pub $field: $ty),*
        }

        impl ContentItem for $name {
            type Draft = $draft;

            const KIND: &'static str = $kind;

            fn id(&self) -> u64 {
                self.id
            }

            fn from_draft(id: u64, draft: $draft, _now: DateTime<Utc>) -> Self {
                Self { id, $($field: draft.$field),* }
            }
        }
    };
}

content_item!(
    /// A banner on the landing page carousel.
    HeroSlide / HeroSlideDraft, "hero slide" {
        title: String,
        subtitle: String,
        image_url: String,
        #[serde(default)]
        cta_label: Option<String>,
        #[serde(default)]
        cta_url: Option<String>,
    }
);

content_item!(TeamMember / TeamMemberDraft, "team member" {
    name: String,
    role: String,
    bio: String,
    #[serde(default)]
    photo_url: Option<String>,
});

content_item!(Project / ProjectDraft, "project" {
    title: String,
    description: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    link: Option<String>,
});

content_item!(Testimonial / TestimonialDraft, "testimonial" {
    author: String,
    #[serde(default)]
    company: Option<String>,
    quote: String,
    /// Out of 5
    #[serde(default)]
    rating: Option<u8>,
});

content_item!(
    /// A call-to-action button shown on the site.
    SiteButton / SiteButtonDraft, "button" {
        label: String,
        url: String,
        style: String,
    }
);

content_item!(SiteSettings / SiteSettingsDraft, "site settings" {
    site_name: String,
    tagline: String,
    contact_email: String,
    contact_phone: String,
    #[serde(default)]
    address: Option<String>,
});

//--------------------------------------       BlogPost       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: u64,
    pub title: String,
    /// Derived from the title unless set explicitly.
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogPostDraft {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ContentItem for BlogPost {
    type Draft = BlogPostDraft;

    const KIND: &'static str = "blog post";

    fn id(&self) -> u64 {
        self.id
    }

    fn from_draft(id: u64, draft: BlogPostDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            slug: slugify(&draft.title),
            title: draft.title,
            excerpt: draft.excerpt,
            content: draft.content,
            author: draft.author,
            image_url: draft.image_url,
            published_at: now,
        }
    }

    fn protected_fields() -> &'static [&'static str] {
        &["id", "published_at"]
    }

    fn after_update(&mut self, patch: &Map<String, Value>) {
        if patch.contains_key("title") && !patch.contains_key("slug") {
            self.slug = slugify(&self.title);
        }
    }
}

//--------------------------------------    ContactMessage    ---------------------------------------------------------
/// A message left through the site's contact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    pub received_at: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactMessageDraft {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

impl ContentItem for ContactMessage {
    type Draft = ContactMessageDraft;

    const KIND: &'static str = "contact message";

    fn id(&self) -> u64 {
        self.id
    }

    fn from_draft(id: u64, draft: ContactMessageDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            subject: draft.subject,
            message: draft.message,
            received_at: now,
            read: false,
        }
    }

    fn protected_fields() -> &'static [&'static str] {
        &["id", "received_at"]
    }
}

//--------------------------------------  NewsletterSubscriber  --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsletterSubscriber {
    pub id: u64,
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
}

impl ContentItem for NewsletterSubscriber {
    /// The subscriber's email address
    type Draft = String;

    const KIND: &'static str = "newsletter subscriber";

    fn id(&self) -> u64 {
        self.id
    }

    fn from_draft(id: u64, email: String, now: DateTime<Utc>) -> Self {
        Self { id, email: email.trim().to_lowercase(), subscribed_at: now }
    }

    fn protected_fields() -> &'static [&'static str] {
        &["id", "subscribed_at"]
    }
}
