// ── Assets ────────────────────────────────────────────────────────────

/// `checkpoint` when any file of a model sits in the base-model bucket.
fn storage_role(storage: &StorageConfig, asset: &AssetRecord) -> &'static str {
    if asset.kind == AssetKind::Image {
        return "image";
    }
    let in_base_bucket = |reference: &StorageRef| is_base_model_ref(storage, reference);
    if in_base_bucket(&asset.storage)
        || asset
            .versions
            .iter()
            .any(|version| in_base_bucket(&version.storage))
    {
        "checkpoint"
    } else {
        "lora"
    }
}

fn parse_visibility(value: &str) -> Result<Visibility, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "public" => Ok(Visibility::Public),
        "private" => Ok(Visibility::Private),
        other => Err(format!("Unknown visibility '{}'", other)),
    }
}

fn read_version_metadata(path: &Path) -> Result<serde_json::Value, String> {
    read_json_file(path).map(|blob| metadata::normalize_value(&blob))
}

async fn run_asset_command(config: &AdminConfig, command: AssetCommand) -> Result<(), String> {
    let client = &api_client(config)?;
    match command {
        AssetCommand::Show { id } => {
            let mut model = load_snapshot("model", client.get_model(&id)).await?;
            model.kind = AssetKind::Model;
            print_model(config, &model);
            Ok(())
        }
        AssetCommand::Edit {
            kind,
            id,
            title,
            description,
            visibility,
            dry_run,
        } => {
            let update = AssetUpdate {
                title,
                description,
                visibility: visibility.as_deref().map(parse_visibility).transpose()?,
                ..Default::default()
            };
            let id = &id;
            submit_draft(update, AssetUpdate::validate, dry_run, "Asset updated", |update| {
                async move {
                    match kind {
                        KindArg::Models => client.update_model(id, &update).await,
                        KindArg::Images => client.update_image(id, &update).await,
                    }
                }
            })
            .await
            .map(|_| ())
        }
        AssetCommand::Delete { kind, id, yes } => match kind {
            KindArg::Models => {
                confirm_and_delete(yes, &format!("model {}", id), client.delete_model(&id)).await
            }
            KindArg::Images => {
                confirm_and_delete(yes, &format!("image {}", id), client.delete_image(&id)).await
            }
        },
        AssetCommand::Versions { model_id } => {
            let versions =
                load_snapshot("model versions", client.list_model_versions(&model_id)).await?;
            let storage = config.storage();
            for version in &versions {
                let role = if is_base_model_ref(&storage, &version.storage) {
                    "checkpoint"
                } else {
                    "lora"
                };
                println!(
                    "{}\t{}\t{:?}\t{}",
                    version.id,
                    version.label,
                    SizeBucket::from_bytes(version.file_size_bytes),
                    role
                );
                let bust = version.updated_at.map(|updated_at| CacheBust {
                    updated_at,
                    entity_id: &version.id,
                });
                if let Some(url) = resolve_storage_url(&storage, &version.storage, bust) {
                    println!("\t{}", url);
                }
            }
            Ok(())
        }
        AssetCommand::EditVersion {
            model_id,
            version_id,
            label,
            metadata,
            dry_run,
        } => {
            let update = VersionUpdate {
                label,
                metadata: metadata.as_deref().map(read_version_metadata).transpose()?,
            };
            let (model_id, version_id) = (&model_id, &version_id);
            submit_draft(update, VersionUpdate::validate, dry_run, "Version updated", |update| {
                async move {
                    client
                        .update_model_version(model_id, version_id, &update)
                        .await
                }
            })
            .await
            .map(|_| ())
        }
        AssetCommand::DeleteVersion {
            model_id,
            version_id,
            yes,
        } => {
            confirm_and_delete(
                yes,
                &format!("version {} of model {}", version_id, model_id),
                client.delete_model_version(&model_id, &version_id),
            )
            .await
        }
    }
}

fn print_model(config: &AdminConfig, model: &AssetRecord) {
    println!("{}\t{}", model.id, model.title);
    if let Some(description) = model.description.as_deref() {
        println!("{}", description);
    }
    println!(
        "owner {}  size {:?}  role {}  versions {}",
        model
            .owner
            .as_ref()
            .map(|owner| owner.name.as_str())
            .unwrap_or("-"),
        model.size_bucket(),
        storage_role(&config.storage(), model),
        model.versions.len()
    );

    let rows = metadata::flatten_metadata(&model.metadata, metadata::is_tag_frequency_key);
    for row in &rows {
        println!("  {}  {}", row.path, row.value);
    }
    for tag in metadata::top_tags(&metadata::extract_tag_frequency(&model.metadata), 10) {
        println!("  #{} ({})", tag.label, tag.count);
    }
}
