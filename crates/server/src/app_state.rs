use admin_module::ModuleContext;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) module: ModuleContext,
    pub(crate) session_cookie: String,
}
