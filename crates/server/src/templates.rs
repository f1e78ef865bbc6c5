use admin_module::{actions::COMMAND_NAMESPACE, menu::module_href};
use askama::Template;
use shared::{
    domain::{FlashMessage, ModuleFunction},
    protocol::{DebugView, DocHeader, ModulePage, ModuleView, PasswordAction, PasswordView},
};

pub struct PageContext<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub doc_header: &'a DocHeader,
    pub shortcut_href: String,
    pub flash_messages: &'a [FlashMessage],
    pub route_path: &'a str,
}

#[derive(Template)]
#[template(path = "admin_module/log.html")]
pub struct LogTemplate<'a> {
    pub base: PageContext<'a>,
}

#[derive(Template)]
#[template(path = "admin_module/debug.html")]
pub struct DebugTemplate<'a> {
    pub base: PageContext<'a>,
    pub view: &'a DebugView,
    pub cmd_field: String,
}

#[derive(Template)]
#[template(path = "admin_module/password.html")]
pub struct PasswordTemplate<'a> {
    pub base: PageContext<'a>,
    pub view: &'a PasswordView,
}

pub fn render_page(page: &ModulePage, route_path: &str) -> askama::Result<String> {
    let shortcut_function =
        ModuleFunction::from_key(&page.doc_header.shortcut.set_function).unwrap_or_default();
    let base = PageContext {
        title: &page.title,
        subtitle: &page.subtitle,
        doc_header: &page.doc_header,
        shortcut_href: module_href(route_path, shortcut_function),
        flash_messages: &page.flash_messages,
        route_path,
    };

    match &page.view {
        ModuleView::Log => LogTemplate { base }.render(),
        ModuleView::Debug(view) => DebugTemplate {
            base,
            view,
            cmd_field: format!("{COMMAND_NAMESPACE}[cmd]"),
        }
        .render(),
        ModuleView::Password(view) => PasswordTemplate { base, view }.render(),
    }
}
