use crate::config::RedditSettings;
use crate::thread::{Comment, Thread};
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde::de::IgnoredAny;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const AGENT: &str = "reddit-narrator-rust/0.1";

#[derive(Debug, Deserialize)]
pub struct RedditListing {
    pub data: RedditListingData,
}

#[derive(Debug, Deserialize)]
pub struct RedditListingData {
    pub children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
pub struct RedditChild {
    pub data: RedditPost,
}

#[derive(Debug, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub over_18: Option<bool>,
    pub stickied: Option<bool>,
    pub num_comments: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CommentListing {
    pub data: CommentListingData,
}

#[derive(Debug, Deserialize)]
pub struct CommentListingData {
    pub children: Vec<CommentChild>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind")]
pub enum CommentChild {
    #[serde(rename = "t1")]
    Comment { data: RedditComment },
    // "more" stubs and anything else we do not narrate
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct RedditComment {
    pub id: String,
    #[serde(default)]
    pub body: String,
    pub stickied: Option<bool>,
}

/// Time filters tried, in order, once the hot listing has nothing left.
pub const TOP_TIME_FILTERS: [&str; 6] = ["day", "hour", "month", "week", "year", "all"];

// Reddit caps listing pages at 100 posts.
const MAX_LISTING_LIMIT: usize = 100;

/// Listing URLs searched for an unused post: `hot` first, then `top` over
/// every time filter with a growing limit.
pub fn listing_urls(subreddit: &str, try_posts: usize) -> Vec<String> {
    let hot = format!(
        "https://www.reddit.com/r/{}/hot.json?limit={}",
        subreddit,
        try_posts.min(MAX_LISTING_LIMIT)
    );
    let top = TOP_TIME_FILTERS.iter().enumerate().map(|(i, filter)| {
        let limit = (try_posts + 25 * (i + 1)).min(MAX_LISTING_LIMIT);
        format!(
            "https://www.reddit.com/r/{}/top.json?t={}&limit={}",
            subreddit, filter, limit
        )
    });
    std::iter::once(hot).chain(top).collect()
}

/// Picks the first unused post of the configured subreddit and loads its
/// top-level comments.
pub async fn fetch_thread(settings: &RedditSettings) -> anyhow::Result<Thread> {
    let client = reqwest::Client::new();
    let mut used_ids = load_used_ids(&settings.used_posts)?;

    for url in listing_urls(&settings.subreddit, settings.try_posts) {
        debug!("Searching {}", url);
        let listing = fetch_listing(&client, &url).await?;
        let candidates: Vec<RedditPost> = listing
            .data
            .children
            .into_iter()
            .map(|c| c.data)
            .filter(|p| is_candidate(p, &used_ids, settings))
            .collect();

        for post in &candidates {
            let comments = fetch_comments(&client, &post.id, settings).await?;
            let thread = build_thread(post, comments, settings);
            if thread.comments.is_empty() && thread.body.is_none() {
                debug!("Skipping post without usable comments: {}", post.title);
                continue;
            }
            info!(
                "Selected post {}: {} ({} comments)",
                post.id,
                post.title,
                thread.comments.len()
            );
            used_ids.insert(post.id.clone());
            save_used_ids(&settings.used_posts, &used_ids)?;
            return Ok(thread);
        }
        info!("No unused post in {}, widening the search", url);
    }
    anyhow::bail!("No suitable posts found in subreddit {}", settings.subreddit);
}

async fn fetch_listing(client: &reqwest::Client, url: &str) -> anyhow::Result<RedditListing> {
    let res = client
        .get(url)
        .header(USER_AGENT, AGENT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(serde_json::from_str(&res)?)
}

async fn fetch_comments(
    client: &reqwest::Client,
    post_id: &str,
    settings: &RedditSettings,
) -> anyhow::Result<CommentListing> {
    let url = format!(
        "https://www.reddit.com/comments/{}.json?sort=top&depth=1&limit={}",
        post_id, settings.max_comments
    );
    let res = client
        .get(&url)
        .header(USER_AGENT, AGENT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let (_post, comments): (IgnoredAny, CommentListing) = serde_json::from_str(&res)?;
    Ok(comments)
}

pub fn is_candidate(post: &RedditPost, used_ids: &HashSet<String>, settings: &RedditSettings) -> bool {
    if used_ids.contains(&post.id) {
        debug!("Skipping already used post: {}", post.title);
        return false;
    }
    if post.over_18.unwrap_or(false) && !settings.allow_nsfw {
        debug!("Skipping NSFW post: {}", post.title);
        return false;
    }
    if post.stickied.unwrap_or(false) {
        debug!("Skipping pinned post: {}", post.title);
        return false;
    }
    if post.num_comments.unwrap_or(0) <= settings.min_comments {
        debug!(
            "Skipping post with {} comments or fewer: {}",
            settings.min_comments, post.title
        );
        return false;
    }
    true
}

pub fn build_thread(post: &RedditPost, comments: CommentListing, settings: &RedditSettings) -> Thread {
    let comments = comments
        .data
        .children
        .into_iter()
        .filter_map(|child| match child {
            CommentChild::Comment { data } => Some(data),
            CommentChild::Other => None,
        })
        .filter(|c| !c.stickied.unwrap_or(false))
        .filter(|c| !matches!(c.body.trim(), "[removed]" | "[deleted]"))
        .filter(|c| {
            let len = c.body.chars().count();
            len >= settings.min_comment_length && len <= settings.max_comment_length
        })
        .take(settings.max_comments)
        .map(|c| Comment {
            id: c.id,
            body: c.body,
        })
        .collect();

    let body = post.selftext.trim();
    Thread {
        id: post.id.clone(),
        title: post.title.trim().to_string(),
        body: (!body.is_empty()).then(|| body.to_string()),
        comments,
    }
}

fn load_used_ids(path: &Path) -> anyhow::Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let data = fs::read_to_string(path)?;
    let ids: Vec<String> = serde_json::from_str(&data)?;
    Ok(ids.into_iter().collect())
}

fn save_used_ids(path: &Path, ids: &HashSet<String>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut ids: Vec<&String> = ids.iter().collect();
    ids.sort();
    let data = serde_json::to_string_pretty(&ids)?;
    fs::write(path, data)?;
    Ok(())
}
