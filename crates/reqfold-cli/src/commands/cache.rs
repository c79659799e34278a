//! Handler for `reqfold cache`.

use miette::Result;

use reqfold_index::artifact_cache::WheelCache;
use reqfold_resolver::cache::DependencyCache;
use reqfold_util::progress;

use super::context::Context;
use crate::cli::CacheAction;

pub fn exec(ctx: &Context, action: CacheAction) -> Result<()> {
    let path = ctx.config.depcache_path();
    match action {
        CacheAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
        CacheAction::List => {
            let cache = DependencyCache::load(&path);
            if cache.is_empty() {
                println!("Dependency cache is empty.");
            }
            for (key, deps) in cache.iter() {
                if deps.is_empty() {
                    println!("{key}: (no dependencies)");
                } else {
                    println!("{key}: {}", deps.join(", "));
                }
            }
            Ok(())
        }
        CacheAction::Clear => {
            let mut cache = DependencyCache::load(&path);
            let entries = cache.len();
            cache.clear()?;
            WheelCache::new(&ctx.config.wheel_cache_dir()).clear()?;
            progress::status("Cleared", &format!("{entries} cached entries"));
            Ok(())
        }
    }
}
