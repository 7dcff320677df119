// ── Asset Browsing ────────────────────────────────────────────────────

struct BrowseFilterArgs<'a> {
    query: String,
    owner: Option<String>,
    tags: Vec<String>,
    type_tag: Option<String>,
    visibility: &'a str,
    size: Option<&'a str>,
    sort: &'a str,
}

fn build_filter_state(args: BrowseFilterArgs<'_>) -> Result<FilterState, String> {
    let visibility = match args.visibility.trim().to_ascii_lowercase().as_str() {
        "" | "all" => VisibilityFilter::All,
        "public" => VisibilityFilter::Public,
        "private" => VisibilityFilter::Private,
        other => return Err(format!("Unknown visibility filter '{}'", other)),
    };
    let size_bucket = match args.size {
        Some(size) => Some(
            SizeBucket::from_str(size).ok_or_else(|| format!("Unknown size bucket '{}'", size))?,
        ),
        None => None,
    };
    let owner = match args.owner.filter(|owner| !owner.trim().is_empty()) {
        Some(owner) => OwnerFilter::Owner(owner.trim().to_string()),
        None => OwnerFilter::All,
    };

    Ok(FilterState {
        query: args.query,
        owner,
        tag_ids: args.tags,
        type_tag_id: args.type_tag,
        visibility,
        size_bucket,
        sort: SortKey::from_str(args.sort),
    })
}

async fn load_assets(
    config: &AdminConfig,
    kind: KindArg,
    snapshot: Option<&Path>,
) -> Result<Vec<AssetRecord>, String> {
    let mut assets = match snapshot {
        Some(path) => {
            let value = read_json_file(path)?;
            let list: crate::api::ListResponse<AssetRecord> =
                serde_json::from_value(value).map_err(|e| e.to_string())?;
            list.into_items()
        }
        None => {
            let client = api_client(config)?;
            match kind {
                KindArg::Models => client.list_models().await,
                KindArg::Images => client.list_images().await,
            }
            .map_err(|e| e.status_message())?
        }
    };

    // Snapshots may mix kinds; API lists are already scoped.
    let wanted = match kind {
        KindArg::Models => AssetKind::Model,
        KindArg::Images => AssetKind::Image,
    };
    if snapshot.is_some() {
        assets.retain(|asset| asset.kind == wanted);
    } else {
        for asset in &mut assets {
            asset.kind = wanted;
        }
    }
    Ok(assets)
}

/// Reveals `pages` batches, spacing the signals past the cooldown.
fn reveal_pages<'a>(
    assets: &'a [AssetRecord],
    filters: FilterState,
    batch_size: usize,
    pages: usize,
) -> (Vec<&'a AssetRecord>, usize) {
    let mut view = PagedView::new(RevealWindow::new(batch_size, DEFAULT_REVEAL_COOLDOWN));
    view.update_filters(filters);

    let total = apply_filters(assets, view.filters()).len();
    let start = Instant::now();
    for step in 1..pages.max(1) {
        let now = start + DEFAULT_REVEAL_COOLDOWN * (step as u32);
        if !view.on_visible(now, total) {
            break;
        }
    }
    (view.page(assets), total)
}

fn preview_url(config: &AdminConfig, asset: &AssetRecord) -> Option<String> {
    let storage = config.storage();
    let bust = asset.updated_at.map(|updated_at| CacheBust {
        updated_at,
        entity_id: &asset.id,
    });
    resolve_storage_url(&storage, &asset.storage, bust).or_else(|| {
        asset.versions.iter().find_map(|version| {
            let bust = version.updated_at.map(|updated_at| CacheBust {
                updated_at,
                entity_id: &version.id,
            });
            resolve_storage_url(&storage, &version.storage, bust)
        })
    })
}

async fn browse_assets(
    config: &AdminConfig,
    kind: KindArg,
    snapshot: Option<&Path>,
    filters: FilterState,
    pages: usize,
) -> Result<(), String> {
    let assets = load_assets(config, kind, snapshot).await?;
    let storage = config.storage();
    let (page, total) = reveal_pages(&assets, filters, config.page_batch_size, pages);

    for asset in &page {
        let owner = asset
            .owner
            .as_ref()
            .map(|owner| owner.name.as_str())
            .unwrap_or("-");
        let visibility = match asset.visibility {
            Visibility::Public => "public",
            Visibility::Private => "private",
        };
        let model_type = asset
            .model_type_tag()
            .map(|tag| tag.label.as_str())
            .unwrap_or("-");
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{:?}",
            asset.id,
            asset.title,
            owner,
            visibility,
            storage_role(&storage, asset),
            model_type,
            asset.size_bucket()
        );
        if let Some(url) = preview_url(config, asset) {
            println!("\t{}", url);
        }
    }
    println!("Showing {} of {} matching assets", page.len(), total);
    Ok(())
}
