use std::path::Path;

use anyhow::Result;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{error, info};

/// 将去重后的 guild id 逐行写入文件，覆盖已有内容
pub async fn save_guild_ids(path: impl AsRef<Path>, guild_ids: &[String]) -> Result<()> {
    let path = path.as_ref();
    let written = async {
        let mut writer = BufWriter::new(File::create(path).await?);
        for id in guild_ids {
            writer.write_all(id.as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }
        writer.flush().await
    }
    .await;

    match written {
        Ok(()) => {
            info!("已写入 {} 条 guild id 到 {}", guild_ids.len(), path.display());
            Ok(())
        }
        Err(e) => {
            error!("Error writing to file {}: {}", path.display(), e);
            Err(e.into())
        }
    }
}
