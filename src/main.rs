use std::error::Error;
use std::time::Duration;

use dotenv::dotenv;
use log;

use ee_prop::common::logger::init_logger;
use ee_prop::common::mqtt::MqttConnection;
use ee_prop::common::setting::Settings;
use ee_prop::driver::host_network::HostNetwork;
use ee_prop::driver::host_platform::HostPlatform;
use ee_prop::http_server::server::HttpAdminServer;
use ee_prop::{run_loop, spawn_loop, Credentials, Prop, PropDrivers};

fn main() -> Result<(), Box<dyn Error>> {
    // 检查 env 文件
    dotenv().ok();

    // 加载 config
    let settings = Settings::get();

    // 设置 logger
    init_logger()?;
    log::info!("配置已加载，环境: {:?}", settings.env.env);
    log::debug!("配置: {:?}", settings);

    let family = settings.prop.family;
    let drivers = PropDrivers {
        network: Box::new(HostNetwork::new(
            family,
            settings.mqtt.broker_host.as_str(),
            settings.mqtt.broker_port,
        )),
        bus: Box::new(MqttConnection::new(
            settings.mqtt.broker_host.as_str(),
            settings.mqtt.broker_port,
        )),
        platform: Box::new(HostPlatform::new(family, settings.prop.hardware_address())),
        admin: Some(Box::new(HttpAdminServer::new(
            settings.web.web_host.as_str(),
            settings.web.web_port,
        ))),
    };

    let mut prop = Prop::new(
        settings.prop.room.as_str(),
        settings.prop.name.as_str(),
        settings.prop.use_id,
        settings.prop.version.as_str(),
        drivers,
    );

    // 简单的应用：根据 payload 设置道具状态
    let flags = prop.flags();
    prop.add_callback(move |topic, payload| {
        log::info!("command on {}: {}", topic, String::from_utf8_lossy(payload));
        match payload {
            b"enable" => flags.set_enabled(true),
            b"disable" => flags.set_enabled(false),
            b"activate" => flags.set_active(true),
            b"solve" => flags.set_solved(true),
            _ => {}
        }
    });
    prop.set_keep_alive(settings.mqtt.keep_alive_secs);
    prop.set_update_interval(Duration::from_millis(settings.prop.update_interval_ms as u64));

    let credentials = Credentials::new(settings.wifi.ssid.as_str(), settings.wifi.password.as_str());
    prop.begin(&credentials)?;

    if family.has_dedicated_context() {
        let handle = spawn_loop(prop)?;
        if handle.join().is_err() {
            log::error!("supervisory loop panicked");
        }
    } else {
        run_loop(&mut prop);
    }

    Ok(())
}
