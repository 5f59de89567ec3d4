pub mod algorithms;
pub mod digest;
pub mod exists;
pub mod get;
pub mod init;
pub mod new_id;
pub mod purge;
pub mod put;
pub mod size;
pub mod version;

pub use algorithms::Algorithms;
pub use digest::Digest;
pub use exists::Exists;
pub use get::Get;
pub use init::Init;
pub use new_id::NewId;
pub use purge::Purge;
pub use put::Put;
pub use size::Size;
pub use version::Version;

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chunk_store::ByteRange;

    use super::*;
    use crate::op::{Op, OpContext, S3Credentials};

    fn context(dir: &Path) -> OpContext {
        OpContext::new(Some(dir.join("state")), S3Credentials::default())
    }

    async fn init(ctx: &OpContext, chunk_length: u64) {
        Init {
            backend: init::BackendType::Sqlite,
            path: None,
            chunk_length: Some(chunk_length.to_string().parse().unwrap()),
            identifier_prefix: Some("test:".to_string()),
            s3_endpoint: None,
            s3_bucket: None,
            s3_region: None,
        }
        .execute(ctx)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_put_get_digest_purge() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = context(temp_dir.path());
        init(&ctx, 5).await;

        let input = temp_dir.path().join("input.bin");
        tokio::fs::write(&input, b"ABCDEFGHIJKL").await.unwrap();

        let output = Put {
            file: input,
            id: Some("doc".to_string()),
            chunk_length: None,
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert!(output.contains("chunks: 3"));

        let out = temp_dir.path().join("out.bin");
        Get {
            id: "doc".to_string(),
            ranges: vec![
                "8-11".parse::<ByteRange>().unwrap(),
                "0-3".parse::<ByteRange>().unwrap(),
            ],
            chunk_length: None,
            out: Some(out.clone()),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(tokio::fs::read(&out).await.unwrap(), b"IJKLABCD");

        let wide = temp_dir.path().join("wide.bin");
        tokio::fs::write(&wide, b"ABCDEFGHIJKL").await.unwrap();
        let output = Put {
            file: wide,
            id: Some("narrow".to_string()),
            chunk_length: Some("3".parse().unwrap()),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert!(output.contains("chunks: 4"));

        let narrow_out = temp_dir.path().join("narrow.bin");
        Get {
            id: "narrow".to_string(),
            ranges: vec!["3-7".parse::<ByteRange>().unwrap()],
            chunk_length: Some("3".parse().unwrap()),
            out: Some(narrow_out.clone()),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(tokio::fs::read(&narrow_out).await.unwrap(), b"DEFGH");

        let size = Size { id: "doc".to_string() }.execute(&ctx).await.unwrap();
        assert_eq!(size, 12);

        let digest = Digest {
            id: "doc".to_string(),
            algorithm: "md5".to_string(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert!(!digest.is_empty());

        Purge { id: "doc".to_string() }.execute(&ctx).await.unwrap();
        assert!(!Exists { id: "doc".to_string() }.execute(&ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_put_generates_identifier() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = context(temp_dir.path());
        init(&ctx, 1024).await;

        let input = temp_dir.path().join("empty.bin");
        tokio::fs::write(&input, b"").await.unwrap();

        let output = Put {
            file: input,
            id: None,
            chunk_length: None,
        }
        .execute(&ctx)
        .await
        .unwrap();

        let identifier = output.lines().next().unwrap();
        assert!(identifier.starts_with("test:"));
        assert!(Exists {
            id: identifier.to_string()
        }
        .execute(&ctx)
        .await
        .unwrap());
    }

    #[tokio::test]
    async fn test_ops_require_init() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = context(temp_dir.path());
        let err = Exists { id: "doc".to_string() }.execute(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }
}
