use std::error::Error;

use oca::xmlrpc;
use oca::{Arg, Transport, TransportError, VmPool};
use tracing::info;

const RESPONSE: &str = r#"<?xml version="1.0"?>
<methodResponse><params><param><value><array><data>
<value><boolean>1</boolean></value>
<value><string>&lt;VM_POOL&gt;
  &lt;VM&gt;&lt;ID&gt;0&lt;/ID&gt;&lt;NAME&gt;web&lt;/NAME&gt;&lt;STATE&gt;3&lt;/STATE&gt;&lt;/VM&gt;
  &lt;VM&gt;&lt;ID&gt;1&lt;/ID&gt;&lt;NAME&gt;db&lt;/NAME&gt;&lt;STATE&gt;5&lt;/STATE&gt;&lt;/VM&gt;
&lt;/VM_POOL&gt;</string></value>
</data></array></value></param></params></methodResponse>"#;

/// Transport that encodes the call like a real client and answers with a canned envelope.
struct Loopback;

impl Transport for Loopback {
    fn call(&self, method: &str, args: &[Arg]) -> Result<String, TransportError> {
        let request = xmlrpc::encode_call(&format!("one.{method}"), args)?;
        info!(bytes = request.len(), method, "encoded request");
        xmlrpc::decode_response(RESPONSE)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let transport = Loopback;
    let mut pool = VmPool::new(&transport);
    pool.refresh(&[Arg::Int(-2)])?;
    for vm in &pool {
        println!("{:<4} {:<10} state={}", vm.id(), vm.name()?, vm.get_int("state")?);
    }
    let db = pool.find_by_name("db")?;
    println!("db has id {}", db.id());
    Ok(())
}
