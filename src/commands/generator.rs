// ── Generator ─────────────────────────────────────────────────────────

fn print_queue_summary(summary: &QueueSummary) {
    println!(
        "pending {}  queued {}  running {}  failed {}",
        summary.pending, summary.queued, summary.running, summary.failed
    );
    match submission_gate(summary) {
        Ok(()) => println!("Accepting new requests"),
        Err(blocked) => println!("Not accepting requests: {}", blocked),
    }
}

fn print_generator_settings(settings: &GeneratorSettings) {
    let limit = |value: u32| {
        if value == 0 {
            "unlimited".to_string()
        } else {
            value.to_string()
        }
    };
    println!("enabled          {}", settings.enabled);
    println!("max steps        {}", limit(settings.max_steps));
    println!("max dimension    {}", limit(settings.max_dimension));
    println!("max loras        {}", limit(settings.max_loras));
    println!(
        "negative prompt  {}",
        settings.default_negative_prompt.as_deref().unwrap_or("-")
    );
}

/// Validates a draft against the live settings and catalog.
fn build_generator_payload(
    draft: GeneratorDraft,
    catalog: Vec<BaseModel>,
    settings: GeneratorSettings,
) -> Result<GeneratorRequestPayload, String> {
    if !settings.enabled {
        return Err("The generator is disabled".to_string());
    }
    GeneratorWizard::with_draft(draft, catalog, Some(settings))
        .build_request()
        .map_err(|errors| AdminError::Validation(errors).to_string())
}

async fn submit_generator_request(
    client: &AdminApiClient,
    draft: GeneratorDraft,
    dry_run: bool,
) -> Result<(), String> {
    let settings = load_snapshot("generator settings", client.get_generator_settings()).await?;
    let catalog = load_snapshot("base models", client.list_base_models()).await?;
    let payload = build_generator_payload(draft, catalog, settings)?;

    if dry_run {
        let json = serde_json::to_string_pretty(&payload).map_err(|e| e.to_string())?;
        println!("{}", json);
        return Ok(());
    }

    let summary = load_snapshot("queue summary", client.get_queue_summary()).await?;
    if let Err(blocked) = submission_gate(&summary) {
        return Err(AdminError::SubmissionBlocked(blocked.to_string()).to_string());
    }

    let mut view: AdminView<(), GeneratorRequestPayload> = AdminView::new();
    view.open_draft(payload);
    let payload = view
        .begin_submit()
        .map_err(|e| format!("Cannot submit: {:?}", e))?;
    let queued = view.finish_submit(
        client.create_generator_request(&payload).await,
        "Request queued",
    );
    print_status(view.status());
    let request = queued.ok_or_else(|| "The server rejected the request".to_string())?;
    log::info!("Queued generator request {}", request.id);
    println!("{}\t{:?}", request.id, request.status);
    Ok(())
}

async fn run_generator_command(
    config: &AdminConfig,
    command: GeneratorCommand,
) -> Result<(), String> {
    let client = &api_client(config)?;
    match command {
        GeneratorCommand::Queue => {
            let summary = load_snapshot("queue summary", client.get_queue_summary()).await?;
            print_queue_summary(&summary);
            Ok(())
        }
        GeneratorCommand::Requests => {
            let requests =
                load_snapshot("generator requests", client.list_generator_requests()).await?;
            for request in &requests {
                println!(
                    "{}\t{:?}\t{}{}",
                    request.id,
                    request.status,
                    request
                        .created_at
                        .map(|at| at.to_rfc3339())
                        .unwrap_or_else(|| "-".to_string()),
                    request
                        .error
                        .as_deref()
                        .map(|error| format!("\t{}", error))
                        .unwrap_or_default()
                );
            }
            Ok(())
        }
        GeneratorCommand::Settings => {
            let settings =
                load_snapshot("generator settings", client.get_generator_settings()).await?;
            print_generator_settings(&settings);
            Ok(())
        }
        GeneratorCommand::SetSettings { file, dry_run } => {
            let settings: GeneratorSettings = read_draft_file(&file)?;
            submit_draft(
                settings,
                GeneratorSettings::validate,
                dry_run,
                "Generator settings saved",
                |settings| async move { client.update_generator_settings(&settings).await },
            )
            .await
            .map(|_| ())
        }
        GeneratorCommand::Submit { file, dry_run } => {
            let draft: GeneratorDraft = read_draft_file(&file)?;
            submit_generator_request(client, draft, dry_run).await
        }
    }
}
