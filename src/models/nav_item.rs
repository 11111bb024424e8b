use std::collections::HashSet;

use serde::Serialize;

use crate::auth::session::SessionContext;
use crate::models::stage::StageKey;

pub const DASHBOARD_ROUTE: &str = "/dashboard";
pub const DASHBOARD_KEY: &str = "dashboard";

/// Node of the two-level navigation tree. `access_key: None` is public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: String,
    pub route: Option<String>,
    pub access_key: Option<String>,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn link(label: &str, route: &str, access_key: Option<&str>) -> Self {
        MenuItem {
            label: label.to_string(),
            route: Some(route.to_string()),
            access_key: access_key.map(String::from),
            children: Vec::new(),
        }
    }

    pub fn group(label: &str, access_key: Option<&str>, children: Vec<MenuItem>) -> Self {
        MenuItem {
            label: label.to_string(),
            route: None,
            access_key: access_key.map(String::from),
            children,
        }
    }

    fn reachable(&self, ctx: &SessionContext) -> bool {
        match &self.access_key {
            None => true,
            Some(key) => ctx.may_access(key),
        }
    }
}

/// Stage queues are one route per stage; conversion and diversion share it
/// and are told apart by the `type` query parameter.
pub fn stage_route(key: StageKey) -> String {
    format!("/applications/{}", key.slug())
}

pub fn default_menu() -> Vec<MenuItem> {
    let queues = StageKey::ALL
        .iter()
        .map(|key| MenuItem::link(key.label(), &stage_route(*key), Some(key.slug())))
        .collect();

    vec![
        MenuItem::link("Dashboard", DASHBOARD_ROUTE, Some(DASHBOARD_KEY)),
        MenuItem::group("Applications", None, queues),
        MenuItem::group(
            "Administration",
            Some("admin"),
            vec![
                MenuItem::link("Users", "/admin/users", Some("users")),
                MenuItem::link("Roles", "/admin/roles", Some("roles")),
            ],
        ),
        MenuItem::link("Profile", "/profile", None),
    ]
}

/// Routes reachable for `ctx`, in menu order and without duplicates.
/// Children are only considered when their parent is reachable; each child
/// is then checked on its own key. Keys go through the same check as
/// `require_permission`, so an admin reaches every route. A granted
/// `dashboard` key guarantees `/dashboard` at the front.
pub fn compute_allowed_routes(menu: &[MenuItem], ctx: &SessionContext) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut routes: Vec<String> = Vec::new();
    let mut push = |route: &str| {
        if seen.insert(route.to_string()) {
            routes.push(route.to_string());
        }
    };

    for item in menu.iter().filter(|i| i.reachable(ctx)) {
        if let Some(route) = &item.route {
            push(route);
        }
        for child in item.children.iter().filter(|c| c.reachable(ctx)) {
            if let Some(route) = &child.route {
                push(route);
            }
        }
    }

    if ctx.may_access(DASHBOARD_KEY) && !routes.iter().any(|r| r == DASHBOARD_ROUTE) {
        routes.insert(0, DASHBOARD_ROUTE.to_string());
    }
    routes
}

/// Where to send a user landing on `active_path`, or `None` to stay.
///
/// The path is compared without its query string. A redirect goes to the
/// first allowed route and keeps the `type` discriminator. With nothing
/// allowed the user is parked on `/dashboard` and never moved off it.
pub fn resolve_redirect(
    active_path: &str,
    type_param: Option<&str>,
    allowed: &[String],
) -> Option<String> {
    let path = active_path
        .split_once('?')
        .map(|(p, _)| p)
        .unwrap_or(active_path);

    if allowed.iter().any(|r| r == path) {
        return None;
    }

    let Some(first) = allowed.first() else {
        return if path == DASHBOARD_ROUTE {
            None
        } else {
            Some(DASHBOARD_ROUTE.to_string())
        };
    };

    match type_param.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => Some(format!("{first}?type={t}")),
        None => Some(first.clone()),
    }
}

/// First allowed route, or `/dashboard` when nothing is allowed.
pub fn landing_route(allowed: &[String]) -> &str {
    allowed.first().map(String::as_str).unwrap_or(DASHBOARD_ROUTE)
}
