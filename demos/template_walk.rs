use std::error::Error;

use oca::xml::{parse_document, Template, VM_TEMPLATE_TAGS};

const TEMPLATE: &str = r#"
<TEMPLATE>
    <NAME>ttylinux</NAME>
    <MEMORY>256</MEMORY>
    <DISK><IMAGE>ttylinux</IMAGE><TARGET>hda</TARGET></DISK>
    <DISK><TYPE>swap</TYPE><SIZE>1024</SIZE></DISK>
    <NIC><NETWORK>public</NETWORK></NIC>
    <NIC><NETWORK>private</NETWORK><IP>10.0.0.5</IP></NIC>
</TEMPLATE>
"#;

fn main() -> Result<(), Box<dyn Error>> {
    let template = Template::new(parse_document(TEMPLATE)?, VM_TEMPLATE_TAGS);
    for (name, value) in template.scalars() {
        println!("{name} = {value}");
    }
    for (name, items) in template.sequences() {
        for (index, item) in items.iter().enumerate() {
            let fields: Vec<String> = item.scalars().map(|(k, v)| format!("{k}={v}")).collect();
            println!("{name}[{index}]: {}", fields.join(", "));
        }
    }
    println!("{}", template.to_xml()?);
    Ok(())
}
