// ── Admin Views ───────────────────────────────────────────────────────

fn print_status(status: Option<&StatusLine>) {
    match status {
        Some(StatusLine::Info { message }) => println!("{}", message),
        Some(StatusLine::Error { message, details }) => {
            eprintln!("{}", message);
            for detail in details {
                eprintln!("  - {}", detail);
            }
        }
        None => {}
    }
}

/// Loads one snapshot through an `AdminView`, printing the status on failure.
async fn load_snapshot<T, Fut>(what: &str, request: Fut) -> Result<T, String>
where
    T: Clone,
    Fut: Future<Output = AdminResult<T>>,
{
    let mut view: AdminView<T, ()> = AdminView::new();
    view.begin_load();
    view.finish_load(request.await);
    match view.snapshot() {
        Some(snapshot) => Ok(snapshot.clone()),
        None => {
            print_status(view.status());
            Err(format!("Failed to load {}", what))
        }
    }
}

/// Validates a draft, then either prints it (dry run) or submits it once.
/// Returns the server's reply when a submit went through.
async fn submit_draft<D, R, F, Fut>(
    draft: D,
    validate: fn(&D) -> Result<(), ValidationErrors>,
    dry_run: bool,
    success_message: &str,
    send: F,
) -> Result<Option<R>, String>
where
    D: Clone + Serialize,
    F: FnOnce(D) -> Fut,
    Fut: Future<Output = AdminResult<R>>,
{
    let validation = validate(&draft);
    let mut view: AdminView<(), D> = AdminView::new();
    view.open_draft(draft);

    if let Err(errors) = validation {
        view.reject_draft(errors);
        print_status(view.status());
        return Err("Input is invalid; nothing was sent".to_string());
    }

    if dry_run {
        if let Some(draft) = view.draft() {
            let json = serde_json::to_string_pretty(draft).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
        view.close_draft();
        return Ok(None);
    }

    let draft = view
        .begin_submit()
        .map_err(|e| format!("Cannot submit: {:?}", e))?;
    let reply = view.finish_submit(send(draft).await, success_message);
    print_status(view.status());
    reply
        .map(Some)
        .ok_or_else(|| "The server rejected the request".to_string())
}

/// Runs a delete through an `AdminView` once the user confirmed it.
async fn confirm_and_delete<Fut>(confirmed: bool, what: &str, action: Fut) -> Result<(), String>
where
    Fut: Future<Output = AdminResult<()>>,
{
    if !confirmed {
        return Err(format!("Refusing to delete {} without --yes", what));
    }
    let mut view: AdminView<(), ()> = AdminView::new();
    view.begin_action()
        .map_err(|e| format!("Cannot delete: {:?}", e))?;
    let outcome = view.finish_submit(action.await, &format!("Deleted {}", what));
    print_status(view.status());
    outcome.ok_or_else(|| format!("Failed to delete {}", what))
}

// ── Users ─────────────────────────────────────────────────────────────

async fn run_user_command(config: &AdminConfig, command: UserCommand) -> Result<(), String> {
    let client = &api_client(config)?;
    match command {
        UserCommand::List => {
            let users = load_snapshot("users", client.list_users()).await?;
            for user in &users {
                println!(
                    "{}\t{}\t{}\t{:?}{}",
                    user.id,
                    user.username,
                    user.display_name.as_deref().unwrap_or("-"),
                    user.role,
                    if user.disabled { "\tdisabled" } else { "" }
                );
            }
            Ok(())
        }
        UserCommand::Create { file, dry_run } => {
            let draft: UserDraft = read_draft_file(&file)?;
            let created = submit_draft(draft, UserDraft::validate, dry_run, "User created", |draft| {
                async move { client.create_user(&draft).await }
            })
            .await?;
            if let Some(user) = created {
                println!("{}\t{}", user.id, user.username);
            }
            Ok(())
        }
        UserCommand::Update { id, file, dry_run } => {
            let draft: UserDraft = read_draft_file(&file)?;
            let id = &id;
            submit_draft(draft, UserDraft::validate, dry_run, "User updated", |draft| {
                async move { client.update_user(id, &draft).await }
            })
            .await
            .map(|_| ())
        }
        UserCommand::Delete { id, yes } => {
            confirm_and_delete(yes, &format!("user {}", id), client.delete_user(&id)).await
        }
    }
}
