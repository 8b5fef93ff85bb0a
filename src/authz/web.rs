use std::collections::BTreeMap;

use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::authz::{self, Action, Feature};
use crate::errors::FolioError;
use crate::session::AuthUser;
use crate::web::{response, AppState};

/// `GET /{family}-resource` for every feature: the actions the caller holds,
/// keyed by the bare feature and its `_other` partner.
pub fn routes() -> Router<AppState> {
    Feature::ALL
        .into_iter()
        .fold(Router::new(), |router, feature| {
            let path = format!("/{}-resource", feature.as_str().replace('_', "-"));
            router.route(
                &path,
                get(move |state: State<AppState>, user: AuthUser| {
                    permitted_actions(state, user, feature)
                }),
            )
        })
}

async fn permitted_actions(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    feature: Feature,
) -> Result<Response, FolioError> {
    let actions: BTreeMap<String, Vec<Action>> = authz::engine(&state.db)
        .permitted_actions(&principal, feature)
        .await?;
    Ok(response::ok(actions))
}
