//! Demonstrates reacting **immediately** to fields of a streamed LLM tool
//! call, before the full response has arrived.
//!
//! The assistant was prompted to answer with a JSON object of this shape:
//!
//! ```text
//! {
//!   "decision": "allow" | "block",
//!   "filename": string,
//!   "code":     string,
//! }
//! ```
//!
//! The `decision` field comes first so that backend code can bail out before
//! the expensive `code` payload even starts arriving, and `code` is streamed
//! fragment by fragment so a UI could render it as it is produced.
//!
//! Run with
//!
//! ```bash
//! cargo run -p jsondemux --example llm_tool_call
//! ```

use jsondemux::{JsonDemux, Schema, ValueKind};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A toy assistant response delivered in small, irregular chunks, the way
    // completion APIs hand out partial tokens. In real life this would come
    // from the network.
    let simulated_stream = [
        r#"{"decision": "al"#,
        r#"low", "filename": "#,
        r#""hello.rs", "code": "fn main() {\n"#,
        r#"    println!(\"hi\");\n"#,
        r#"}\n""#,
        r#"}"#,
    ];

    let schema = Schema::builder()
        .single("decision", ValueKind::enumerated(["allow", "block"]))
        .single("filename", ValueKind::String)
        .stream("code", ValueKind::String)
        .build();
    let mut demux = JsonDemux::new(schema);
    let handle = demux.handle();

    // The moderation gate: waits on `decision` alone and fires as soon as
    // that field's value closes, long before `code` finished streaming.
    let gate = tokio::spawn({
        let handle = handle.clone();
        async move {
            let decision = handle.single("decision").value().await?;
            println!("[gate] decision = {decision}");
            Ok::<_, jsondemux::DemuxError>(decision)
        }
    });

    // The renderer: prints each code fragment the instant it is lexed.
    let renderer = tokio::spawn({
        let handle = handle.clone();
        async move {
            let mut fragments = handle.stream("code").iter();
            while let Some(fragment) = fragments.next().await {
                print!("{}", fragment?);
            }
            println!();
            Ok::<_, jsondemux::DemuxError>(())
        }
    });

    for chunk in simulated_stream {
        demux.feed(chunk)?;
        // Let the consumers run between network chunks.
        tokio::task::yield_now().await;
    }

    let decision = gate.await.unwrap()?;
    renderer.await.unwrap()?;
    println!(
        "[done] {} -> {}",
        handle.single("filename").value().await?,
        decision
    );
    Ok(())
}
