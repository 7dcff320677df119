// ── Galleries ─────────────────────────────────────────────────────────

async fn run_gallery_command(config: &AdminConfig, command: GalleryCommand) -> Result<(), String> {
    let client = &api_client(config)?;
    match command {
        GalleryCommand::List => {
            let galleries = load_snapshot("galleries", client.list_galleries()).await?;
            let storage = config.storage();
            for gallery in &galleries {
                println!(
                    "{}\t{}\t{} entries",
                    gallery.id,
                    gallery.title,
                    gallery.entries.len()
                );
                let bust = gallery.updated_at.map(|updated_at| CacheBust {
                    updated_at,
                    entity_id: &gallery.id,
                });
                if let Some(cover) = resolve_storage_url(&storage, &gallery.cover, bust) {
                    println!("\t{}", cover);
                }
            }
            Ok(())
        }
        GalleryCommand::Create { file, dry_run } => {
            let draft: GalleryDraft = read_draft_file(&file)?;
            let created = submit_draft(
                draft,
                GalleryDraft::validate,
                dry_run,
                "Gallery created",
                |draft| async move { client.create_gallery(&draft).await },
            )
            .await?;
            if let Some(gallery) = created {
                println!("{}\t{}", gallery.id, gallery.title);
            }
            Ok(())
        }
        GalleryCommand::Update { id, file, dry_run } => {
            let draft: GalleryDraft = read_draft_file(&file)?;
            let id = &id;
            submit_draft(
                draft,
                GalleryDraft::validate,
                dry_run,
                "Gallery updated",
                |draft| async move { client.update_gallery(id, &draft).await },
            )
            .await
            .map(|_| ())
        }
        GalleryCommand::Delete { id, yes } => {
            confirm_and_delete(yes, &format!("gallery {}", id), client.delete_gallery(&id)).await
        }
        GalleryCommand::AddEntry {
            gallery_id,
            asset_id,
            position,
            caption,
            dry_run,
        } => {
            let entry = GalleryEntryDraft {
                asset_id,
                position,
                caption,
            };
            let gallery_id = &gallery_id;
            let added = submit_draft(
                entry,
                GalleryEntryDraft::validate,
                dry_run,
                "Entry added",
                |entry| async move { client.add_gallery_entry(gallery_id, &entry).await },
            )
            .await?;
            if let Some(entry) = added {
                println!("{}\t{}\t#{}", entry.id, entry.asset_id, entry.position);
            }
            Ok(())
        }
        GalleryCommand::RemoveEntry {
            gallery_id,
            entry_id,
            yes,
        } => {
            confirm_and_delete(
                yes,
                &format!("entry {} of gallery {}", entry_id, gallery_id),
                client.remove_gallery_entry(&gallery_id, &entry_id),
            )
            .await
        }
    }
}

// ── Ranking ───────────────────────────────────────────────────────────

fn print_ranking(settings: &RankingSettings, tiers: &mut [RankingTier]) {
    tiers.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));

    println!("download weight   {}", settings.download_weight);
    println!("like weight       {}", settings.like_weight);
    println!("comment weight    {}", settings.comment_weight);
    println!("recency weight    {}", settings.recency_weight);
    println!("recency half-life {}h", settings.recency_half_life_hours);
    for tier in tiers.iter() {
        println!(
            "{}\t{}\t>= {}{}",
            tier.id,
            tier.label,
            tier.min_score,
            tier.badge
                .as_deref()
                .map(|badge| format!("\t{}", badge))
                .unwrap_or_default()
        );
    }
}

async fn run_ranking_command(config: &AdminConfig, command: RankingCommand) -> Result<(), String> {
    let client = &api_client(config)?;
    match command {
        RankingCommand::Show => {
            let settings = load_snapshot("ranking settings", client.get_ranking_settings()).await?;
            let mut tiers = load_snapshot("ranking tiers", client.list_ranking_tiers()).await?;
            print_ranking(&settings, &mut tiers);
            Ok(())
        }
        RankingCommand::SetWeights { file, dry_run } => {
            let settings: RankingSettings = read_draft_file(&file)?;
            submit_draft(
                settings,
                RankingSettings::validate,
                dry_run,
                "Ranking weights saved",
                |settings| async move { client.update_ranking_settings(&settings).await },
            )
            .await
            .map(|_| ())
        }
        RankingCommand::SetTier { file, dry_run } => {
            let tier: RankingTier = read_draft_file(&file)?;
            submit_draft(
                tier,
                RankingTier::validate,
                dry_run,
                "Ranking tier saved",
                |tier| async move { client.update_ranking_tier(&tier).await },
            )
            .await
            .map(|_| ())
        }
    }
}
