//! The site's page vocabulary.
//!
//! Page paths are a fixed enumeration owned by the site; the resolver only
//! adds or strips country slugs around them. Pages are either
//! country-scoped (served under every country slug) or global (auth,
//! dashboard and admin screens, served only without a slug).

use crate::link::rewrite_link;
use crate::path::{ParsedPath, split_suffix};
use crate::registry::{CountryRegistry, ResolvedCountry};
use serde::Serialize;
use std::fmt;

/// First path segments owned by the page vocabulary. No country slug may
/// reuse one.
pub const RESERVED_SEGMENTS: &[&str] = &[
    "home",
    "about-us",
    "services",
    "contact",
    "gallery",
    "career",
    "blog",
    "blogs",
    "news",
    "projects",
    "advantages",
    "global-presence",
    "privacy-policy",
    "terms-and-conditions",
    "login",
    "admin-login",
    "signup",
    "forgot-password",
    "blog-editor",
    "dashboard",
    "admin",
];

/// Service detail pages under `/services/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServicePage {
    /// `/services/sea-freight`
    SeaFreight,
    /// `/services/air-freight`
    AirFreight,
    /// `/services/customs-clearance`
    CustomsClearance,
    /// `/services/warehousing`
    Warehousing,
    /// `/services/consolidation`
    Consolidation,
    /// `/services/project-cargo`
    ProjectCargo,
    /// `/services/liquid-cargo`
    LiquidCargo,
    /// `/services/third-party-logistics`
    ThirdPartyLogistics,
    /// `/services/liner-agency`
    LinerAgency,
    /// `/services/lcl`
    Lcl,
    /// `/services/fcl`
    Fcl,
    /// `/services/import`
    Import,
    /// `/services/oog-shipments`
    OogShipments,
}

impl ServicePage {
    /// Every service page, in site order.
    pub const ALL: [Self; 13] = [
        Self::SeaFreight,
        Self::AirFreight,
        Self::CustomsClearance,
        Self::Warehousing,
        Self::Consolidation,
        Self::ProjectCargo,
        Self::LiquidCargo,
        Self::ThirdPartyLogistics,
        Self::LinerAgency,
        Self::Lcl,
        Self::Fcl,
        Self::Import,
        Self::OogShipments,
    ];

    /// Path segment after `/services/`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::SeaFreight => "sea-freight",
            Self::AirFreight => "air-freight",
            Self::CustomsClearance => "customs-clearance",
            Self::Warehousing => "warehousing",
            Self::Consolidation => "consolidation",
            Self::ProjectCargo => "project-cargo",
            Self::LiquidCargo => "liquid-cargo",
            Self::ThirdPartyLogistics => "third-party-logistics",
            Self::LinerAgency => "liner-agency",
            Self::Lcl => "lcl",
            Self::Fcl => "fcl",
            Self::Import => "import",
            Self::OogShipments => "oog-shipments",
        }
    }

    /// Translation key of the page title.
    #[must_use]
    pub const fn label_key(self) -> &'static str {
        match self {
            Self::SeaFreight => "services.sea.title",
            Self::AirFreight => "services.air.title",
            Self::CustomsClearance => "services.customs.title",
            Self::Warehousing => "services.warehouse.title",
            Self::Consolidation => "services.consolidation.title",
            Self::ProjectCargo => "services.projectCargo.title",
            Self::LiquidCargo => "services.liquid.title",
            Self::ThirdPartyLogistics => "services.thirdParty.title",
            Self::LinerAgency => "services.liner.title",
            Self::Lcl => "services.lcl.title",
            Self::Fcl => "services.fcl.title",
            Self::Import => "services.import.title",
            Self::OogShipments => "services.oog.title",
        }
    }

    fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|page| page.slug() == slug)
    }
}

/// A page of the site, independent of any country prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Page {
    /// `/` or `/home`
    Home,
    /// `/about-us`
    AboutUs,
    /// `/services`
    Services,
    /// `/services/{service}`
    Service(ServicePage),
    /// `/contact`
    Contact,
    /// `/gallery`
    Gallery,
    /// `/career`
    Career,
    /// `/blog` or `/blogs`
    Blog,
    /// `/blog/{slug}`
    BlogPost(String),
    /// `/news`
    News,
    /// `/projects`
    Projects,
    /// `/advantages`
    Advantages,
    /// `/global-presence`
    GlobalPresence,
    /// `/privacy-policy`
    PrivacyPolicy,
    /// `/terms-and-conditions`
    TermsAndConditions,
    /// `/login` or `/admin-login`
    Login,
    /// `/signup`
    Signup,
    /// `/forgot-password`
    ForgotPassword,
    /// `/blog-editor`
    BlogEditor,
    /// `/dashboard` and its sections.
    Dashboard(Option<String>),
    /// `/admin` and its sections.
    Admin(Option<String>),
}

impl Page {
    /// Classify a logical path (no country slug) into a page.
    ///
    /// Query strings and fragments are ignored. Returns `None` for paths the
    /// site does not serve. A leading `home` segment is accepted in front of
    /// country-scoped pages, so `/home/contact` is the contact page.
    ///
    /// # Examples
    ///
    /// ```
    /// use country_router::routes::{Page, ServicePage};
    ///
    /// assert_eq!(Page::classify("/services/lcl"), Some(Page::Service(ServicePage::Lcl)));
    /// assert_eq!(Page::classify("/blogs"), Some(Page::Blog));
    /// assert_eq!(Page::classify("/home/contact"), Some(Page::Contact));
    /// assert_eq!(Page::classify("/warehouse"), None);
    /// ```
    #[must_use]
    pub fn classify(path: &str) -> Option<Self> {
        let (path_part, _) = split_suffix(path.trim());
        let segments: Vec<&str> = path_part.split('/').filter(|s| !s.is_empty()).collect();
        Self::from_segments(&segments)
    }

    fn from_segments(segments: &[&str]) -> Option<Self> {
        match segments {
            [] | ["home"] => Some(Self::Home),
            ["home", rest @ ..] => Self::from_segments(rest).filter(Self::is_country_scoped),
            ["about-us"] => Some(Self::AboutUs),
            ["services"] => Some(Self::Services),
            ["services", service] => ServicePage::from_slug(service).map(Self::Service),
            ["contact"] => Some(Self::Contact),
            ["gallery"] => Some(Self::Gallery),
            ["career"] => Some(Self::Career),
            ["blog" | "blogs"] => Some(Self::Blog),
            ["blog", slug] => Some(Self::BlogPost((*slug).to_owned())),
            ["news"] => Some(Self::News),
            ["projects"] => Some(Self::Projects),
            ["advantages"] => Some(Self::Advantages),
            ["global-presence"] => Some(Self::GlobalPresence),
            ["privacy-policy"] => Some(Self::PrivacyPolicy),
            ["terms-and-conditions"] => Some(Self::TermsAndConditions),
            ["login" | "admin-login"] => Some(Self::Login),
            ["signup"] => Some(Self::Signup),
            ["forgot-password"] => Some(Self::ForgotPassword),
            ["blog-editor"] => Some(Self::BlogEditor),
            ["dashboard"] => Some(Self::Dashboard(None)),
            ["dashboard", section] => Some(Self::Dashboard(Some((*section).to_owned()))),
            ["admin"] => Some(Self::Admin(None)),
            ["admin", rest @ ..] => Some(Self::Admin(Some(rest.join("/")))),
            _ => None,
        }
    }

    /// Resolve a parsed path into a page, honouring page scope: global
    /// pages are not served under a country slug.
    #[must_use]
    pub fn route(parsed: &ParsedPath) -> Option<Self> {
        let page = Self::classify(&parsed.remainder)?;
        if parsed.country_slug.is_some() && !page.is_country_scoped() {
            return None;
        }
        Some(page)
    }

    /// Whether the page exists under every country slug.
    #[must_use]
    pub const fn is_country_scoped(&self) -> bool {
        !matches!(
            self,
            Self::Login
                | Self::Signup
                | Self::ForgotPassword
                | Self::BlogEditor
                | Self::Dashboard(_)
                | Self::Admin(_)
                | Self::News
                | Self::Advantages
                | Self::PrivacyPolicy
                | Self::TermsAndConditions
        )
    }

    /// Logical base path of the page.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => String::from("/"),
            Self::AboutUs => String::from("/about-us"),
            Self::Services => String::from("/services"),
            Self::Service(service) => format!("/services/{}", service.slug()),
            Self::Contact => String::from("/contact"),
            Self::Gallery => String::from("/gallery"),
            Self::Career => String::from("/career"),
            Self::Blog => String::from("/blog"),
            Self::BlogPost(slug) => format!("/blog/{slug}"),
            Self::News => String::from("/news"),
            Self::Projects => String::from("/projects"),
            Self::Advantages => String::from("/advantages"),
            Self::GlobalPresence => String::from("/global-presence"),
            Self::PrivacyPolicy => String::from("/privacy-policy"),
            Self::TermsAndConditions => String::from("/terms-and-conditions"),
            Self::Login => String::from("/login"),
            Self::Signup => String::from("/signup"),
            Self::ForgotPassword => String::from("/forgot-password"),
            Self::BlogEditor => String::from("/blog-editor"),
            Self::Dashboard(None) => String::from("/dashboard"),
            Self::Dashboard(Some(section)) => format!("/dashboard/{section}"),
            Self::Admin(None) => String::from("/admin"),
            Self::Admin(Some(section)) => format!("/admin/{section}"),
        }
    }

    /// Link to this page for `country`. Global pages are never prefixed.
    #[must_use]
    pub fn link(&self, registry: &CountryRegistry, country: &ResolvedCountry) -> String {
        let base = self.path();
        if !self.is_country_scoped() {
            return base;
        }
        // Country home pages live at `/{slug}/home`, the default home at `/`.
        if *self == Self::Home && !registry.is_default(&country.code) {
            return rewrite_link(registry, "/home", country);
        }
        rewrite_link(registry, &base, country)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// One entry of the service navigation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    /// Translation key of the entry label.
    pub label_key: &'static str,
    /// Country-prefixed link target.
    pub path: String,
}

const SERVICES_NAV: [ServicePage; 9] = [
    ServicePage::Lcl,
    ServicePage::Fcl,
    ServicePage::Warehousing,
    ServicePage::ProjectCargo,
    ServicePage::AirFreight,
    ServicePage::CustomsClearance,
    ServicePage::Import,
    ServicePage::Consolidation,
    ServicePage::OogShipments,
];

/// Service navigation menu with links rewritten for `country`.
///
/// # Examples
///
/// ```
/// use country_router::registry::CountryRegistry;
/// use country_router::routes::services_nav;
///
/// let registry = CountryRegistry::builtin();
/// let lk = registry.by_code("lk").expect("sri lanka").to_resolved();
/// let nav = services_nav(&registry, &lk);
/// assert_eq!(nav[0].path, "/sri-lanka/services");
/// assert_eq!(nav[1].path, "/sri-lanka/services/lcl");
/// ```
#[must_use]
pub fn services_nav(registry: &CountryRegistry, country: &ResolvedCountry) -> Vec<NavEntry> {
    let overview = NavEntry {
        label_key: "services.seeAllServices",
        path: Page::Services.link(registry, country),
    };
    let pages = SERVICES_NAV.into_iter().map(|service| NavEntry {
        label_key: service.label_key(),
        path: Page::Service(service).link(registry, country),
    });
    std::iter::once(overview).chain(pages).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse_path;
    use rstest::rstest;

    #[rstest]
    #[case("/", Some(Page::Home))]
    #[case("/home", Some(Page::Home))]
    #[case("/about-us", Some(Page::AboutUs))]
    #[case("/services/oog-shipments", Some(Page::Service(ServicePage::OogShipments)))]
    #[case("/services/unknown", None)]
    #[case("/blog/new-routes", Some(Page::BlogPost(String::from("new-routes"))))]
    #[case("/dashboard/shipments", Some(Page::Dashboard(Some(String::from("shipments")))))]
    #[case("/admin/blog/edit/7", Some(Page::Admin(Some(String::from("blog/edit/7")))))]
    #[case("/contact?ref=nav", Some(Page::Contact))]
    #[case("/nope", None)]
    #[case("/blogs/new-routes", None)]
    #[case("/home/contact", Some(Page::Contact))]
    #[case("/home/services/lcl", Some(Page::Service(ServicePage::Lcl)))]
    #[case("/home/blog/new-routes", Some(Page::BlogPost(String::from("new-routes"))))]
    #[case("/home/dashboard", None)]
    #[case("/home/login", None)]
    fn classifies_paths(#[case] path: &str, #[case] expected: Option<Page>) {
        assert_eq!(Page::classify(path), expected);
    }

    #[rstest]
    #[case("/myanmar/contact", Some(Page::Contact))]
    #[case("/myanmar/dashboard", None)]
    #[case("/dashboard", Some(Page::Dashboard(None)))]
    #[case("/pakistan/services/fcl", Some(Page::Service(ServicePage::Fcl)))]
    fn route_honours_page_scope(#[case] raw: &str, #[case] expected: Option<Page>) {
        let registry = CountryRegistry::builtin();
        assert_eq!(Page::route(&parse_path(&registry, raw)), expected);
    }

    #[test]
    fn every_page_path_classifies_back_to_itself() {
        let mut pages = vec![
            Page::Home,
            Page::AboutUs,
            Page::Services,
            Page::Contact,
            Page::GlobalPresence,
            Page::BlogPost(String::from("hello")),
            Page::Admin(Some(String::from("users"))),
        ];
        pages.extend(ServicePage::ALL.into_iter().map(Page::Service));
        for page in pages {
            assert_eq!(Page::classify(&page.path()), Some(page.clone()), "{page}");
        }
    }

    #[test]
    fn reserved_segments_all_name_pages() {
        for segment in RESERVED_SEGMENTS {
            assert!(Page::classify(&format!("/{segment}")).is_some(), "{segment}");
        }
    }

    #[test]
    fn links_keep_global_pages_unprefixed() {
        let registry = CountryRegistry::builtin();
        let bd = registry.by_code("bd").expect("bangladesh").to_resolved();
        assert_eq!(Page::Dashboard(None).link(&registry, &bd), "/dashboard");
        assert_eq!(Page::Contact.link(&registry, &bd), "/bangladesh/contact");
        assert_eq!(Page::Home.link(&registry, &bd), "/bangladesh/home");

        let sg = registry.default_country().to_resolved();
        assert_eq!(Page::Home.link(&registry, &sg), "/");
    }

    #[test]
    fn default_country_services_nav_is_unprefixed() {
        let registry = CountryRegistry::builtin();
        let sg = registry.default_country().to_resolved();
        let nav = services_nav(&registry, &sg);
        assert_eq!(nav.len(), 10);
        assert!(nav.iter().all(|entry| entry.path.starts_with("/services")));
        assert_eq!(nav[0].label_key, "services.seeAllServices");
    }
}
