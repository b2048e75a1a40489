//! CLI entry point (`chmweb` binary), spec §6 "CLI surface" and SPEC_FULL.md
//! §A.4: extracts one or more archives, runs the discovery/rewrite pipeline
//! against the result, and writes the static site. Never writes to stdout
//! outside the pipeline's own output files (`print_stdout` is denied
//! crate-wide); all progress and diagnostics go to stderr via `tracing`.

use std::ffi::OsStr;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::filter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use chmweb_chm::{AkLinkTable, BTreeKind, TopicTableSource};
use chmweb_fs::FsCache;
use chmweb_pool::{worker::DEFAULT_WORKER_ENV_VAR, Pool};
use chmweb_render::LinkMap;
use chmweb_scan::JobResponse;
use chmweb_toc::{parse_col, ArchiveRegistry, ContentsTree, DetachedNode, NodeIndex, NodeKind, ROOT};
use chmweb_types::{issues::IN_MEMORY, Settings};

/// Converts a Microsoft Compiled HTML Help archive, archive set, or
/// collection into a standalone static website.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// One or more `.chm` archives, or a single `.chw` collection, followed
    /// by the output directory.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    inputs: Vec<PathBuf>,

    /// Gzip every persisted output file and remove the uncompressed original.
    #[arg(long)]
    gzip_pages: bool,

    /// Dump the contents tree as JSON alongside the rendered site.
    #[arg(long, value_name = "PATH")]
    write_toc_json: Option<PathBuf>,

    /// Dump every recorded warning as JSON.
    #[arg(long, value_name = "PATH")]
    write_issues: Option<PathBuf>,

    /// Worker pool size. Defaults to available parallelism.
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,

    /// Archive extractor binary.
    #[arg(long, env = "CHMWEB_EXTRACTOR", default_value = "7z", value_name = "PATH")]
    extractor: PathBuf,

    /// Treat any recorded warning as fatal (exit non-zero after the run
    /// completes), restoring the original tool's `--strict` flag.
    #[arg(long)]
    deny_warnings: bool,

    #[command(flatten)]
    verbose: Verbosity,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let (outdir, archives) = cli
        .inputs
        .split_last()
        .context("expected one or more archives followed by an output directory")?;
    if archives.is_empty() {
        bail!("expected one or more archives followed by an output directory");
    }

    let settings = Settings {
        out_root: outdir.clone(),
        gzip_pages: cli.gzip_pages,
        write_toc_json: cli.write_toc_json.clone(),
        write_issues: cli.write_issues.clone(),
        extractor: cli.extractor.clone(),
        jobs: cli.jobs.unwrap_or_else(|| Settings::default().jobs),
        deny_warnings: cli.deny_warnings,
    };
    chmweb_types::init_settings(settings);
    let settings = chmweb_types::settings();

    std::fs::create_dir_all(outdir).with_context(|| format!("creating output directory {outdir:?}"))?;

    let mut registry = ArchiveRegistry::new();
    let mut tree = ContentsTree::new();
    let mut alink = chmweb_types::KeywordMap::new();
    let mut klink = chmweb_types::KeywordMap::new();

    if archives.len() == 1 && has_extension(&archives[0], "chw") {
        load_collection(&archives[0], outdir, settings, &mut registry, &mut tree, &mut alink, &mut klink)?;
    } else {
        load_archive_set(archives, outdir, settings, &mut registry, &mut tree, &mut alink, &mut klink)?;
    }

    let cache = FsCache::new(outdir.clone());
    let mut data = chmweb_scan::TreeData::new(registry, tree, alink, klink);

    let worker_binary = worker_binary_path();
    let pool: Pool<JobResponse> =
        Pool::spawn(&worker_binary, settings.jobs.max(1)).with_context(|| format!("spawning worker pool at {worker_binary:?}"))?;

    chmweb_scan::discover(&cache, &pool, &mut data)?;

    let link_map = LinkMap::build(&cache, &data);
    chmweb_render::render_pages(&mut data, &link_map, outdir)?;

    if let Some(path) = &settings.write_toc_json {
        write_toc_json(&data.tree, &link_map, path)?;
    }
    if let Some(path) = &settings.write_issues {
        write_issues_json(path)?;
    }
    if settings.gzip_pages {
        gzip_outputs(outdir)?;
    }

    info!(
        pages = data.pages.len(),
        assets = data.assets.len(),
        "chmweb run complete"
    );

    if settings.deny_warnings && !IN_MEMORY.is_empty() {
        bail!("{} warning(s) recorded; aborting due to --deny-warnings", IN_MEMORY.issues().len());
    }
    Ok(())
}

fn init_tracing(cli: &Cli) {
    let fmt_filter = filter::Targets::new().with_default(cli.verbose.tracing_level_filter());
    let memory_filter = filter::Targets::new().with_default(Level::WARN);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false)
                .compact()
                .with_filter(fmt_filter),
        )
        .with(IN_MEMORY.clone().with_filter(memory_filter))
        .init();
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(OsStr::to_str).is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn stem_of(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(OsStr::to_str)
        .map(str::to_string)
        .with_context(|| format!("archive path {path:?} has no file stem"))
}

/// `<file.chm> <outdir>` and `<file1.chm> <file2.chm> … <outdir>`: each
/// archive extracted to its own subdirectory (empty subdirectory, i.e. the
/// output root itself, when there is exactly one archive), spec §6.
#[allow(clippy::too_many_arguments)]
fn load_archive_set(
    archives: &[PathBuf],
    outdir: &Path,
    settings: &Settings,
    registry: &mut ArchiveRegistry,
    tree: &mut ContentsTree,
    alink: &mut chmweb_types::KeywordMap,
    klink: &mut chmweb_types::KeywordMap,
) -> Result<()> {
    let single = archives.len() == 1;
    for archive in archives {
        let stem = stem_of(archive)?;
        let subdir = if single { String::new() } else { stem.clone() };
        registry.register(&stem, &subdir)?;

        let extracted_root = outdir.join(&subdir);
        extract_archive(&settings.extractor, archive, &extracted_root)?;

        let mut ak = AkLinkTable::new();
        load_archive_tables(&mut ak, &extracted_root, 0, &subdir)?;
        merge_keyword_maps(alink, klink, &ak);

        tree.append_child(ROOT, NodeKind::ArchivePlaceholder { stem });
    }
    Ok(())
}

/// `<file.chw> <outdir>`: layout driven by the sibling `.col` file, member
/// archives and their topic/keyword tables loaded per the chw's
/// `$HHTitleMap`, spec §4.5 "Multi-archive (chw) layout".
#[allow(clippy::too_many_arguments)]
fn load_collection(
    chw_path: &Path,
    outdir: &Path,
    settings: &Settings,
    registry: &mut ArchiveRegistry,
    tree: &mut ContentsTree,
    alink: &mut chmweb_types::KeywordMap,
    klink: &mut chmweb_types::KeywordMap,
) -> Result<()> {
    let col_path = chw_path.with_extension("col");
    let col_src = chmweb_util::io::read_to_string(&col_path).with_context(|| format!("reading collection sibling {col_path:?}"))?;
    let roots = parse_col(&col_src);
    for root in roots {
        attach_detached(tree, ROOT, root);
    }

    // The chw container itself holds no page content, only the title map
    // and the aggregate B-trees; extracted to a scratch directory rather
    // than under `outdir` so its internal binary streams never appear
    // among the persisted website pages (DESIGN.md).
    let scratch = chw_scratch_dir(chw_path);
    extract_archive(&settings.extractor, chw_path, &scratch)?;

    let title_map_bytes = chmweb_util::io::read(scratch.join("$HHTitleMap")).context("reading $HHTitleMap from chw container")?;
    let stems = chmweb_chm::decode_title_map(&title_map_bytes)?;

    let mut ak = AkLinkTable::new();
    let parent_dir = chw_path.parent().map(Path::to_path_buf).unwrap_or_default();
    for stem in &stems {
        registry.register(stem, stem)?;
        let ordinal = registry.ordinal(stem).expect("just registered");

        let member_archive = parent_dir.join(format!("{stem}.chm"));
        if !member_archive.exists() {
            warn!(source = "filesystem-access-denied", archive = %stem, "collection member archive not found beside the .chw file");
            continue;
        }
        let extracted_root = outdir.join(stem);
        extract_archive(&settings.extractor, &member_archive, &extracted_root)?;
        load_archive_tables(&mut ak, &extracted_root, ordinal, stem)?;
    }

    for (file, kind) in [
        ("$WWAssociativeLinks/BTree", BTreeKind::ALink),
        ("$WWKeywordLinks/BTree", BTreeKind::KLink),
    ] {
        let path = scratch.join(file);
        if path.exists() {
            let data = chmweb_util::io::read(&path)?;
            ak.merge_btree(&data, kind)?;
        }
    }
    merge_keyword_maps(alink, klink, &ak);

    let _ = std::fs::remove_dir_all(&scratch);
    Ok(())
}

fn chw_scratch_dir(chw_path: &Path) -> PathBuf {
    let stem = chw_path.file_stem().and_then(OsStr::to_str).unwrap_or("chw");
    std::env::temp_dir().join(format!("chmweb-{stem}-{}", std::process::id()))
}

fn attach_detached(tree: &mut ContentsTree, parent: NodeIndex, node: DetachedNode) -> NodeIndex {
    let idx = tree.append_child(parent, node.kind);
    for child in node.children {
        attach_detached(tree, idx, child);
    }
    idx
}

/// Loads one archive's five side-tables (plus its own associative/keyword
/// B-trees, if present) into `ak` at `archive_ord`, spec §4.5.
fn load_archive_tables(ak: &mut AkLinkTable, extracted_root: &Path, archive_ord: u32, subdir: &str) -> Result<()> {
    let topics = chmweb_util::io::read(extracted_root.join("#TOPICS")).context("reading #TOPICS")?;
    let strings = chmweb_util::io::read(extracted_root.join("#STRINGS")).context("reading #STRINGS")?;
    let urltbl = chmweb_util::io::read(extracted_root.join("#URLTBL")).context("reading #URLTBL")?;
    let urlstr = chmweb_util::io::read(extracted_root.join("#URLSTR")).context("reading #URLSTR")?;
    let source = TopicTableSource {
        topics: &topics,
        strings: &strings,
        urltbl: &urltbl,
        urlstr: &urlstr,
    };
    ak.add_archive_topics(archive_ord, &source, subdir)?;

    for (file, kind) in [
        ("$WWAssociativeLinks/BTree", BTreeKind::ALink),
        ("$WWKeywordLinks/BTree", BTreeKind::KLink),
    ] {
        let path = extracted_root.join(file);
        if path.exists() {
            let data = chmweb_util::io::read(&path)?;
            ak.merge_btree(&data, kind)?;
        }
    }
    Ok(())
}

/// Unions one archive's private keyword tables into the run's combined
/// A-link/K-link maps — every archive loaded this way contributes to the
/// same flat `KeywordMap` the tree scanner and rewriter consume.
fn merge_keyword_maps(alink: &mut chmweb_types::KeywordMap, klink: &mut chmweb_types::KeywordMap, ak: &AkLinkTable) {
    for key in ak.alink_keys().map(str::to_string).collect::<Vec<_>>() {
        for topic in ak.alink(&key) {
            alink.insert(key.clone(), topic.clone());
        }
    }
    for key in ak.klink_keys().map(str::to_string).collect::<Vec<_>>() {
        for topic in ak.klink(&key) {
            klink.insert(key.clone(), topic.clone());
        }
    }
}

/// Spec §6 "Archive extractor": invoked as a child process with the
/// archive path, an output directory, and flags requesting overwrite and
/// silence. A non-zero exit status is fatal.
fn extract_archive(extractor: &Path, archive: &Path, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir).with_context(|| format!("creating extraction directory {out_dir:?}"))?;
    let mut out_arg = OsStr::new("-o").to_os_string();
    out_arg.push(out_dir.as_os_str());
    let status = Command::new(extractor)
        .arg("x")
        .arg(archive)
        .arg(out_arg)
        .arg("-y")
        .status()
        .with_context(|| format!("invoking extractor {extractor:?} on {archive:?}"))?;
    if !status.success() {
        bail!("extractor {extractor:?} exited with {status} on {archive:?}");
    }
    Ok(())
}

fn worker_binary_path() -> PathBuf {
    if std::env::var_os(DEFAULT_WORKER_ENV_VAR).is_some() {
        return chmweb_pool::default_worker_binary();
    }
    let sibling_name = if cfg!(windows) { "chmweb-worker.exe" } else { "chmweb-worker" };
    if let Some(sibling) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(|dir| dir.join(sibling_name))) {
        if sibling.exists() {
            std::env::set_var(DEFAULT_WORKER_ENV_VAR, &sibling);
            return sibling;
        }
    }
    chmweb_pool::default_worker_binary()
}

#[derive(Serialize)]
struct TocJsonNode {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<TocJsonNode>>,
}

/// Spec §6 "TOC JSON": an array of `{title, path?, children?}` mirroring the
/// contents tree, page paths canonicalised via the Link Map.
fn write_toc_json(tree: &ContentsTree, link_map: &LinkMap, path: &Path) -> Result<()> {
    let nodes: Vec<TocJsonNode> = tree.children(ROOT).iter().filter_map(|&idx| toc_json_node(tree, idx, link_map)).collect();
    let json = serde_json::to_string_pretty(&nodes)?;
    chmweb_util::io::write(path, json)?;
    Ok(())
}

fn toc_json_node(tree: &ContentsTree, idx: NodeIndex, link_map: &LinkMap) -> Option<TocJsonNode> {
    let (title, path) = match tree.kind(idx) {
        NodeKind::Root => return None,
        NodeKind::Folder { title } => (title.clone(), None),
        NodeKind::Page { title, filename, .. } => {
            let canonical = link_map.get(filename).unwrap_or(filename);
            let title = title.clone().unwrap_or_else(|| filename.file_name().to_string());
            (title, Some(canonical.as_str().to_string()))
        }
        // Every placeholder is resolved by discovery before rendering; one
        // surviving here means its archive was never registered.
        NodeKind::ArchivePlaceholder { stem } => (format!("={stem}"), None),
    };
    let children: Vec<TocJsonNode> = tree.children(idx).iter().filter_map(|&c| toc_json_node(tree, c, link_map)).collect();
    Some(TocJsonNode {
        title,
        path,
        children: if children.is_empty() { None } else { Some(children) },
    })
}

fn write_issues_json(path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&IN_MEMORY.issues())?;
    chmweb_util::io::write(path, json)?;
    Ok(())
}

/// Spec §6 "Persisted output layout": "with gzip, all outputs are written
/// as `*.gz` and the originals are removed." Walks the whole output tree —
/// the rendered pages, toc/resolution pages, and the extracted archive's
/// own files alike, matching the spec's unqualified "all outputs".
fn gzip_outputs(dir: &Path) -> Result<()> {
    let mut files = Vec::new();
    collect_gzip_candidates(dir, &mut files)?;
    files.into_par_iter().try_for_each(|path| gzip_one(&path))
}

fn collect_gzip_candidates(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading directory {dir:?}"))? {
        let path = entry?.path();
        if path.is_dir() {
            collect_gzip_candidates(&path, out)?;
        } else if !has_extension(&path, "gz") {
            out.push(path);
        }
    }
    Ok(())
}

fn gzip_one(path: &Path) -> Result<()> {
    let data = chmweb_util::io::read(path)?;
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&data)?;
    let compressed = encoder.finish()?;

    let mut gz_name = path.as_os_str().to_os_string();
    gz_name.push(".gz");
    chmweb_util::io::write(PathBuf::from(gz_name), compressed)?;
    std::fs::remove_file(path).with_context(|| format!("removing {path:?} after gzip"))?;
    Ok(())
}
