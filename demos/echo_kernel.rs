//! Minimal in-process kernel: a front-end and a kernel joined by in-memory
//! channels, with an arithmetic toy engine.
//!
//! Run with: cargo run --example echo_kernel

use bytes::Bytes;
use replwire::engine::{EvaluationError, ExecutionEngine};
use replwire::protocol::{ExecuteReply, ExecuteRequest, MessageKind};
use replwire::transport::pair;
use replwire::{Kernel, Parent, Session};

/// Evaluates `a+b` integer sums; anything else is an error.
struct Calculator;

impl ExecutionEngine for Calculator {
    fn evaluate(&mut self, code: &str) -> Result<Option<String>, EvaluationError> {
        let sum = code
            .split('+')
            .map(|part| part.trim().parse::<i64>())
            .try_fold(0i64, |acc, n| n.map(|n| acc + n));
        match sum {
            Ok(sum) => Ok(Some(sum.to_string())),
            Err(e) => Err(EvaluationError {
                etype: "ParseError".to_string(),
                evalue: e.to_string(),
                traceback: vec![format!("while evaluating: {code}")],
            }),
        }
    }
}

#[tokio::main]
async fn main() -> replwire::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let key = "demo-key";
    let (shell_kernel, mut shell_front) = pair();
    let (iopub_kernel, mut iopub_front) = pair();

    let mut kernel = Kernel::new(
        Session::new("kernel", key),
        shell_kernel,
        iopub_kernel,
        Box::new(Calculator),
    );
    let kernel_task = tokio::spawn(async move { kernel.run().await });

    let front = Session::new("demo-front", key);
    let identity = Bytes::from_static(b"demo");

    for code in ["1+1", "10+20+12", "not math"] {
        let request = front.message(
            MessageKind::ExecuteRequest,
            &ExecuteRequest {
                code: code.to_string(),
            },
            Parent::None,
        )?;
        front
            .send(&mut shell_front, &request, &[identity.clone()])
            .await?;

        let reply = front.recv(&mut shell_front).await?;
        let reply: ExecuteReply = reply.message.parse_content()?;
        println!("{code:>12} => {:?} (count {})", reply.status, reply.execution_count);

        while let Some(broadcast) = front.try_recv(&mut iopub_front).await? {
            println!("{:>12}    broadcast {}", "", broadcast.message.header.msg_type);
        }
    }

    drop(shell_front);
    drop(iopub_front);
    kernel_task.await.map_err(|e| {
        replwire::KernelError::Protocol(format!("kernel task panicked: {e}"))
    })??;
    Ok(())
}
