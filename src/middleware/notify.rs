use uuid::Uuid;

use crate::models::NotificationKind;
use crate::state::SharedState;

/// In-app notification plus an optional email copy. Failures are logged, never surfaced.
pub async fn user(
    state: &SharedState,
    user_id: Uuid,
    kind: NotificationKind,
    title: &str,
    message: &str,
    link: &str,
) {
    if let Err(e) =
        crate::db::notifications::create(&state.pool, user_id, kind, title, message, Some(link))
            .await
    {
        tracing::error!("Failed to create notification: {e}");
        return;
    }

    let Some(mailer) = state.system_mailer.clone() else {
        return;
    };
    let email = match crate::db::users::find_by_id(&state.pool, user_id).await {
        Ok(Some(user)) if user.is_active => user.email,
        Ok(_) => return,
        Err(e) => {
            tracing::error!("Failed to look up notification recipient: {e}");
            return;
        }
    };
    let url = format!("{}{link}", state.config.base_url);
    let (title, message) = (title.to_string(), message.to_string());
    tokio::spawn(async move {
        if let Err(e) = mailer.send_decision(&email, &title, &message, &url).await {
            tracing::warn!("Failed to email notification to {email}: {e}");
        }
    });
}

/// Notify the login linked to an employee, if there is one.
pub async fn employee(
    state: &SharedState,
    employee_id: Uuid,
    kind: NotificationKind,
    title: &str,
    message: &str,
    link: &str,
) {
    match crate::db::users::find_by_employee(&state.pool, employee_id).await {
        Ok(Some(u)) => user(state, u.id, kind, title, message, link).await,
        Ok(None) => {}
        Err(e) => tracing::error!("Failed to look up employee user: {e}"),
    }
}
