//! Transactional email bodies. French copy, plain text first; the host
//! recap carries an HTML variant so the moderation links render as buttons.

use crate::config::AppConfig;
use crate::models::pricing::{balance_after_deposit, deposit_30};
use crate::models::BookingRequest;
use crate::services::mailer::OutboundEmail;

pub struct ModerationLinks {
    pub accept: String,
    pub refuse: String,
    pub reply: String,
}

fn eur(v: f64) -> String {
    format!("{v:.2} €")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

fn pricing_lines(booking: &BookingRequest) -> String {
    let p = &booking.pricing;
    let lines = [
        ("Base hébergement", p.base_accommodation),
        ("Ménage (fixe)", p.cleaning),
        ("Animaux", p.animals),
        ("Bois (poêle)", p.wood),
        ("Visiteurs (journée)", p.visitors),
        ("Personnes supplémentaires (nuits)", p.extra_sleepers),
        ("Arrivée début de journée", p.early_arrival),
        ("Départ fin de journée", p.late_departure),
        ("Taxe de séjour", p.tourist_tax),
    ];
    lines
        .iter()
        .filter(|(_, v)| *v > 0.0)
        .map(|(label, v)| format!("- {label} : {}", eur(*v)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Recap sent to the host with the three signed action links.
pub fn host_new_request(
    config: &AppConfig,
    booking: &BookingRequest,
    links: &ModerationLinks,
    contract_link: &str,
) -> OutboundEmail {
    let subject = format!(
        "Nouvelle demande — {} ({} → {})",
        booking.name, booking.start_date, booking.end_date
    );

    let text = format!(
        "Nouvelle demande de réservation\n\
         {} — {} — {}\n\
         \n\
         Séjour : {} → {} ({} nuit(s))\n\
         Voyageurs : {} adulte(s) / {} enfant(s)\n\
         Animaux : {}\n\
         \n\
         Total estimé (serveur) : {}\n\
         {}\n\
         {}\
         \n\
         Accepter : {}\n\
         Refuser : {}\n\
         Répondre : {}\n\
         \n\
         Lien contrat (après acceptation) :\n{}\n\
         \n\
         Les liens expirent automatiquement. Ne transférez pas cet email.",
        booking.name,
        booking.email,
        booking.phone.as_deref().unwrap_or("—"),
        booking.start_date,
        booking.end_date,
        booking.nights,
        booking.adults,
        booking.children,
        booking.animals_summary(),
        eur(booking.pricing.total),
        pricing_lines(booking),
        booking
            .message
            .as_deref()
            .map(|m| format!("\nMessage :\n{m}\n"))
            .unwrap_or_default(),
        links.accept,
        links.refuse,
        links.reply,
        contract_link,
    );

    let html = format!(
        "<div style=\"font-family:system-ui,-apple-system,Segoe UI,Roboto,Arial;line-height:1.45\">\
         <h2>Nouvelle demande de réservation</h2>\
         <p><b>{}</b> — {} — {}</p>\
         <p><b>Séjour :</b> {} → {} ({} nuit(s))</p>\
         <p><b>Voyageurs :</b> {} adulte(s) / {} enfant(s)</p>\
         <p><b>Animaux :</b> {}</p>\
         <p><b>Total estimé (serveur) :</b> {}</p>\
         <p style=\"display:flex;gap:10px;flex-wrap:wrap\">\
         <a href=\"{}\" style=\"background:#16a34a;color:#fff;padding:10px 14px;border-radius:10px;text-decoration:none\">Accepter</a>\
         <a href=\"{}\" style=\"background:#dc2626;color:#fff;padding:10px 14px;border-radius:10px;text-decoration:none\">Refuser</a>\
         <a href=\"{}\" style=\"background:#0f172a;color:#fff;padding:10px 14px;border-radius:10px;text-decoration:none\">Répondre</a>\
         </p>\
         <p>Lien contrat (après acceptation) :<br/><a href=\"{}\">{}</a></p>\
         <p style=\"color:#64748b;font-size:12px\">Les liens expirent automatiquement. Ne transférez pas cet email.</p>\
         </div>",
        escape_html(&booking.name),
        escape_html(&booking.email),
        escape_html(booking.phone.as_deref().unwrap_or("—")),
        booking.start_date,
        booking.end_date,
        booking.nights,
        booking.adults,
        booking.children,
        escape_html(&booking.animals_summary()),
        eur(booking.pricing.total),
        escape_html(&links.accept),
        escape_html(&links.refuse),
        escape_html(&links.reply),
        escape_html(contract_link),
        escape_html(contract_link),
    );

    OutboundEmail {
        to: config.notify_email.clone(),
        subject,
        text,
        html: Some(html),
        reply_to: Some(
            config
                .reply_to
                .clone()
                .unwrap_or_else(|| booking.email.clone()),
        ),
    }
}

/// Acknowledgement sent to the guest right after submission.
pub fn guest_acknowledgement(config: &AppConfig, booking: &BookingRequest) -> OutboundEmail {
    let subject = format!("Nous avons bien reçu votre demande — {}", config.property_name);

    let text = format!(
        "Bonjour {},\n\
         Merci pour votre demande de disponibilité pour {}.\n\
         \n\
         Récapitulatif de votre demande :\n\
         - Séjour : {} → {} ({} nuit(s))\n\
         - Voyageurs : {} adulte(s) / {} enfant(s)\n\
         - Animaux : {}\n\
         - Estimation : {} (estimation, sous réserve de confirmation)\n\
         \n\
         Nous revenons vers vous dès que possible pour confirmer la disponibilité.\n\
         Important : si vous ne recevez pas notre réponse, merci de vérifier votre dossier Courrier indésirable / Spam ainsi que l'onglet Promotions (Gmail).\n\
         \n\
         Cordialement,\n\
         {} — {}",
        booking.name,
        config.property_name,
        booking.start_date,
        booking.end_date,
        booking.nights,
        booking.adults,
        booking.children,
        booking.animals_summary(),
        eur(booking.pricing.total),
        config.host_name,
        config.property_name,
    );

    OutboundEmail {
        to: booking.email.clone(),
        subject,
        text,
        html: None,
        reply_to: config.reply_to.clone(),
    }
}

/// "Accepted, next steps" notification sent to the guest.
pub fn guest_accepted(
    config: &AppConfig,
    booking: &BookingRequest,
    contract_link: &str,
) -> OutboundEmail {
    let subject =
        "Votre demande de réservation est acceptée — étape suivante : contrat & acompte"
            .to_string();

    let text = format!(
        "Bonjour {},\n\
         Bonne nouvelle : votre demande de réservation est acceptée pour {} aux dates suivantes : {} → {} ({} nuit(s)).\n\
         Afin de valider votre réservation et pouvoir vous accueillir, merci de suivre les deux étapes suivantes :\n\
         \n\
         Étape 1 — Contrat à compléter et signer\n\
         Merci de compléter et signer le contrat via le lien ci-dessous :\n\
         {}\n\
         \n\
         Étape 2 — Acompte de 30% à régler après signature\n\
         Une fois le contrat signé, vous recevrez automatiquement les informations de paiement (RIB) ainsi que le montant exact de l'acompte.\n\
         Important : si vous ne voyez pas nos messages, merci de vérifier votre dossier Courrier indésirable / Spam et l'onglet Promotions (Gmail).\n\
         Cordialement,\n\
         {} — {}",
        booking.name,
        config.property_name,
        booking.start_date,
        booking.end_date,
        booking.nights,
        contract_link,
        config.host_name,
        config.property_name,
    );

    OutboundEmail {
        to: booking.email.clone(),
        subject,
        text,
        html: None,
        reply_to: config.reply_to.clone(),
    }
}

/// Polite unavailability notification sent to the guest.
pub fn guest_refused(config: &AppConfig, booking: &BookingRequest) -> OutboundEmail {
    let subject = format!("Indisponibilité — {}", config.property_name);

    let text = format!(
        "Bonjour {},\n\
         Merci pour votre demande concernant {}.\n\
         Malheureusement, nous ne pouvons pas donner suite pour les dates {} → {}, car le logement n'est pas disponible sur cette période.\n\
         Si vous le souhaitez, vous pouvez nous proposer d'autres dates.\n\
         Cordialement,\n\
         {} — {}",
        booking.name,
        config.property_name,
        booking.start_date,
        booking.end_date,
        config.host_name,
        config.property_name,
    );

    OutboundEmail {
        to: booking.email.clone(),
        subject,
        text,
        html: None,
        reply_to: config.reply_to.clone(),
    }
}

/// 6-digit signature code, always sent to the on-file address.
pub fn guest_otp_code(config: &AppConfig, booking: &BookingRequest, code: &str) -> OutboundEmail {
    let subject = format!("Votre code de signature — {}", config.property_name);

    let text = format!(
        "Bonjour {},\n\
         Voici votre code de signature électronique : {code}\n\
         Ce code est valable environ 10 minutes. Saisissez-le dans la page du contrat pour confirmer votre signature.\n\
         Si vous n'êtes pas à l'origine de cette demande, ignorez cet email.\n\
         Cordialement,\n\
         {} — {}",
        booking.name, config.host_name, config.property_name,
    );

    OutboundEmail {
        to: booking.email.clone(),
        subject,
        text,
        html: None,
        reply_to: config.reply_to.clone(),
    }
}

const HOUSE_RULES_ANNEX: &str = "\
ANNEXE — RÈGLEMENT INTÉRIEUR\n\
1. Capacité maximale : 8 personnes. Toute personne supplémentaire doit être déclarée.\n\
2. Arrivée entre 16h et 18h ; départ au plus tard 10h, logement libre de personnes et bagages.\n\
3. Animaux admis uniquement s'ils ont été déclarés dans la demande.\n\
4. Le logement est non fumeur.\n\
5. Piscine et lac : baignade sous la responsabilité exclusive des occupants ; enfants sous surveillance permanente d'un adulte.\n\
6. Poêle à bois : utiliser uniquement le bois fourni ; ne jamais laisser un feu sans surveillance.\n\
7. Les visiteurs à la journée doivent être signalés au propriétaire.\n\
8. Le locataire s'engage à rendre le logement dans l'état de propreté constaté à l'arrivée.\n\
9. Tout dommage doit être signalé avant le départ.\n\
10. Le non-respect du présent règlement peut entraîner la résiliation du contrat sans remboursement.";

/// Signed confirmation: deposit amount, bank transfer details (RIB) and the
/// full house-rules annex.
pub fn guest_signed(config: &AppConfig, booking: &BookingRequest) -> OutboundEmail {
    let total = booking.pricing.total;
    let deposit = deposit_30(total);
    let balance = balance_after_deposit(total);

    let subject = format!("Contrat signé — acompte de 30% — {}", config.property_name);

    let text = format!(
        "Bonjour {},\n\
         Votre contrat est signé pour {} aux dates {} → {} ({} nuit(s)).\n\
         \n\
         Pour bloquer vos dates de réservation, merci d'effectuer le paiement des 30% (soit {}) par virement bancaire.\n\
         Le solde ({}) sera à régler selon les modalités prévues au contrat, au plus tard 7 jours avant l'entrée dans les lieux.\n\
         \n\
         Coordonnées bancaires (RIB) :\n\
         Titulaire : {}\n\
         IBAN : {}\n\
         BIC : {}\n\
         Merci d'indiquer votre nom et vos dates de séjour en référence du virement.\n\
         \n\
         {}\n\
         \n\
         Cordialement,\n\
         {} — {}",
        booking.name,
        config.property_name,
        booking.start_date,
        booking.end_date,
        booking.nights,
        eur(deposit),
        eur(balance),
        config.bank_holder,
        config.bank_iban,
        config.bank_bic,
        HOUSE_RULES_ANNEX,
        config.host_name,
        config.property_name,
    );

    OutboundEmail {
        to: booking.email.clone(),
        subject,
        text,
        html: None,
        reply_to: config.reply_to.clone(),
    }
}

/// Internal notice to the host when a contract is signed.
pub fn host_signed_notice(config: &AppConfig, booking: &BookingRequest) -> OutboundEmail {
    let deposit = deposit_30(booking.pricing.total);

    let subject = format!(
        "Contrat signé — {} ({} → {})",
        booking.name, booking.start_date, booking.end_date
    );

    let text = format!(
        "Le contrat de {} ({}) vient d'être signé.\n\
         Séjour : {} → {} ({} nuit(s))\n\
         Total : {} — acompte attendu : {}",
        booking.name,
        booking.email,
        booking.start_date,
        booking.end_date,
        booking.nights,
        eur(booking.pricing.total),
        eur(deposit),
    );

    OutboundEmail {
        to: config.notify_email.clone(),
        subject,
        text,
        html: None,
        reply_to: None,
    }
}

/// Internal notice when the guest declares the deposit transfer sent.
pub fn host_transfer_declared(config: &AppConfig, booking: &BookingRequest) -> OutboundEmail {
    let deposit = deposit_30(booking.pricing.total);

    let subject = format!(
        "Virement déclaré — {} ({} → {})",
        booking.name, booking.start_date, booking.end_date
    );

    let text = format!(
        "{} ({}) déclare avoir envoyé le virement d'acompte de {}.\n\
         Séjour : {} → {} ({} nuit(s)). À vérifier sur le compte.",
        booking.name,
        booking.email,
        eur(deposit),
        booking.start_date,
        booking.end_date,
        booking.nights,
    );

    OutboundEmail {
        to: config.notify_email.clone(),
        subject,
        text,
        html: None,
        reply_to: None,
    }
}

pub struct ReviewLinks {
    pub approve: String,
    pub reject: String,
}

/// Moderation recap for a new guest review.
pub fn host_new_review(
    config: &AppConfig,
    name: &str,
    rating: i64,
    comment: &str,
    links: &ReviewLinks,
) -> OutboundEmail {
    let subject = format!("Nouvel avis — {name} ({rating}/5)");

    let text = format!(
        "Nouvel avis de {name} ({rating}/5) :\n\
         \n\
         {comment}\n\
         \n\
         Publier : {}\n\
         Refuser : {}\n\
         \n\
         Les liens expirent automatiquement.",
        links.approve, links.reject,
    );

    OutboundEmail {
        to: config.notify_email.clone(),
        subject,
        text,
        html: None,
        reply_to: None,
    }
}
